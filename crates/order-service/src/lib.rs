//! Order Service Library
//!
//! Provides the core components of the order service: payload validation,
//! the ingestion/lookup orchestrator, durable storage, cache warm-up and the
//! HTTP front end.

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod orchestrator;
pub mod rehydrate;
pub mod server;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

pub use cache::OrderCache;
pub use config::Config;
pub use database::{OrderStore, PgOrderStore};
pub use error::{ApiError, OrderError, Result};
pub use orchestrator::OrderService;
pub use server::{bind, create_router, start_server, ServerState, SharedState};
pub use types::*;
