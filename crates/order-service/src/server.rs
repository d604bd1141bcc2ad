//! HTTP server for order lookups, cache inspection and health checks
//!
//! Provides /order/{order_uid}, /cache, /health, and / (lookup page) endpoints.

use crate::error::ApiError;
use crate::orchestrator::OrderService;
use crate::types::{CachedOrder, IngestStats};
use axum::{
    extract::{Path, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use order_cache::CacheStats;
use order_db::Order;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// Cached orders listed by /cache
const CACHE_SAMPLE_SIZE: usize = 20;

/// Shared state for the HTTP server
pub struct ServerState {
    pub service: Arc<OrderService>,
    pub started_at: DateTime<Utc>,
    /// Whether the order stream is currently connected
    pub stream_connected: AtomicBool,
    /// Set once the subscription has given up; ingestion will not resume
    pub stream_stopped: AtomicBool,
}

impl ServerState {
    pub fn new(service: Arc<OrderService>) -> Self {
        Self {
            service,
            started_at: Utc::now(),
            stream_connected: AtomicBool::new(false),
            stream_stopped: AtomicBool::new(false),
        }
    }

    pub fn set_stream_connected(&self, connected: bool) {
        self.stream_connected.store(connected, Ordering::Relaxed);
    }

    pub fn set_stream_stopped(&self) {
        self.stream_connected.store(false, Ordering::Relaxed);
        self.stream_stopped.store(true, Ordering::Relaxed);
    }
}

pub type SharedState = Arc<ServerState>;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    uptime: i64,
    db_status: &'static str,
    stream_connected: bool,
    cache_size: usize,
}

/// Cache inspection response
#[derive(Serialize)]
struct CacheResponse {
    cache_size: usize,
    stats: CacheStats,
    ingest: IngestStats,
    /// Oldest cached orders, up to a fixed sample size
    sample: Vec<CachedOrder>,
    server_time: String,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(lookup_page))
        .route("/order/{order_uid}", get(get_order))
        .route("/cache", get(cache_info))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the HTTP listener on all interfaces
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    Ok(listener)
}

/// Serve HTTP on `listener`, stopping gracefully once `shutdown` completes
pub async fn start_server<F>(
    state: SharedState,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn get_order(
    State(state): State<SharedState>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>, ApiError> {
    debug!(order_uid = %order_uid, "Order lookup");
    match state.service.get_order(&order_uid).await? {
        Some(order) => Ok(Json(order)),
        None => Err(ApiError::OrderNotFound(order_uid)),
    }
}

async fn cache_info(State(state): State<SharedState>) -> Json<CacheResponse> {
    let service = &state.service;
    Json(CacheResponse {
        cache_size: service.cache_size().await,
        stats: service.cache_stats().await,
        ingest: service.ingest_stats(),
        sample: service.cached_orders(CACHE_SAMPLE_SIZE).await,
        server_time: Utc::now().to_rfc3339(),
    })
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let db_status = match state.service.check_durable_connection().await {
        Ok(()) => "healthy",
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            "unhealthy"
        }
    };

    let status = if state.stream_stopped.load(Ordering::Relaxed) {
        "degraded"
    } else {
        "healthy"
    };

    let now = Utc::now();
    Json(HealthResponse {
        status,
        service: "order-service",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now.to_rfc3339(),
        uptime: (now - state.started_at).num_seconds(),
        db_status,
        stream_connected: state.stream_connected.load(Ordering::Relaxed),
        cache_size: state.service.cache_size().await,
    })
}

async fn lookup_page() -> Html<&'static str> {
    Html(LOOKUP_HTML)
}

const LOOKUP_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Order Service</title>
  <style>
    body { font-family: monospace; padding: 1rem; }
    input { font-family: monospace; width: 24rem; }
    pre { background: #f4f4f4; padding: 0.5rem; }
    .error { color: red; }
  </style>
</head>
<body>
  <h1>Order Service</h1>

  <form id="lookup">
    <input id="uid" placeholder="order_uid" autofocus>
    <button type="submit">Find</button>
  </form>
  <pre id="result"></pre>

  <h2>Cache</h2>
  <pre id="cache">Loading...</pre>

  <script>
    document.getElementById('lookup').addEventListener('submit', async (e) => {
      e.preventDefault();
      const uid = document.getElementById('uid').value.trim();
      const out = document.getElementById('result');
      if (!uid) return;
      const res = await fetch('/order/' + encodeURIComponent(uid));
      out.className = res.ok ? '' : 'error';
      out.textContent = JSON.stringify(await res.json(), null, 2);
    });

    async function refresh() {
      try {
        const res = await fetch('/cache');
        document.getElementById('cache').textContent = JSON.stringify(await res.json(), null, 2);
      } catch (err) {
        document.getElementById('cache').textContent = 'Error';
      }
    }

    refresh();
    setInterval(refresh, 5000);
  </script>
</body>
</html>"#;
