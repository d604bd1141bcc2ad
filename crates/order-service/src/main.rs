//! Order Service - stream-fed order store with a read-through cache
//!
//! This service consumes orders from an upstream WebSocket feed, persists them
//! to PostgreSQL, and serves lookups over HTTP from an in-memory cache.

use clap::Parser;
use order_cache::CacheStore;
use order_db::Order;
use order_service::{
    bind, rehydrate, start_server, Config, OrderError, OrderService, PgOrderStore, Result,
    ServerState,
};
use order_stream::{OrderStream, StreamEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

const POOL_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("order_service=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Order Service...");

    let config = Config::parse();
    config.validate()?;
    info!("Stream: {}", config.stream_url);
    info!("Port: {}", config.port);

    // Connect to database
    let store = Arc::new(PgOrderStore::connect(&config).await?);
    store.migrate().await?;

    // Warm the cache before taking any traffic
    let cache = Arc::new(CacheStore::<Order>::new(config.cache_config()));
    match rehydrate::restore(&*store, &*cache, config.cache_restore_limit).await {
        Ok(restored) => info!(restored, "Cache warmed"),
        Err(e) => warn!(error = %e, "Cache restore failed, starting with an empty cache"),
    }

    let service = Arc::new(OrderService::new(store.clone(), cache.clone()));
    let state = Arc::new(ServerState::new(service.clone()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn HTTP server
    let listener = bind(config.port).await?;
    let http_state = state.clone();
    let mut http_shutdown = shutdown_rx.clone();
    let server = tokio::spawn(async move {
        let signal = async move {
            let _ = http_shutdown.changed().await;
        };
        if let Err(e) = start_server(http_state, listener, signal).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Spawn order stream subscription
    let (event_tx, mut event_rx) = mpsc::channel::<StreamEvent>(1000);
    let stream_config = config.stream_config();
    let subscription = tokio::spawn(async move {
        let mut stream = OrderStream::new(stream_config, event_tx);
        stream.run().await
    });

    // Process stream events until asked to stop or the stream gives up
    let mut stream_ended = false;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = event_rx.recv() => match event {
                Some(StreamEvent::Payload(payload)) => {
                    // Failures are logged by the service; keep consuming
                    if let Err(e) = service.process_order(&payload).await {
                        debug!(error = %e, "Payload not ingested");
                    }
                }
                Some(StreamEvent::Connected) => {
                    info!("Connected to order stream");
                    state.set_stream_connected(true);
                }
                Some(StreamEvent::Disconnected) => {
                    warn!("Disconnected from order stream");
                    state.set_stream_connected(false);
                }
                Some(StreamEvent::Error(e)) => {
                    error!("Order stream error: {}", e);
                }
                None => {
                    error!("Order stream ended, shutting down");
                    state.set_stream_stopped();
                    stream_ended = true;
                    break;
                }
            },
        }
    }

    info!("Shutting down...");
    if !stream_ended {
        subscription.abort();
    }
    let stream_result = match subscription.await {
        Ok(result) => result.map_err(OrderError::from),
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(e.into()),
    };
    shutdown_tx.send_replace(true);
    if let Err(e) = server.await {
        warn!(error = %e, "HTTP server task ended abnormally");
    }

    cache.stop().await;

    if tokio::time::timeout(POOL_CLOSE_TIMEOUT, store.close())
        .await
        .is_err()
    {
        warn!("Timed out closing database pool");
    }

    let stats = service.ingest_stats();
    info!(
        processed = stats.processed,
        malformed = stats.malformed,
        invalid = stats.invalid,
        failed = stats.failed,
        "Shutdown complete"
    );

    // A non-zero exit lets the supervisor restart ingestion
    stream_result
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
