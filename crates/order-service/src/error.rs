//! Error types for the order service

use crate::validation::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Malformed payload: {0}")]
    Malformed(String),
    #[error("Invalid order: {0}")]
    Invalid(#[from] ValidationError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Order stream stopped: {0}")]
    Stream(#[from] order_stream::StreamError),
    #[error("Order stream task failed: {0}")]
    StreamTask(#[from] tokio::task::JoinError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for OrderError {
    fn from(err: serde_json::Error) -> Self {
        OrderError::Malformed(err.to_string())
    }
}

impl From<tracing_subscriber::filter::ParseError> for OrderError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        OrderError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;

/// Error returned by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    OrderNotFound(String),
    Internal(OrderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::OrderNotFound(order_uid) => (
                StatusCode::NOT_FOUND,
                axum::Json(json!({
                    "error": "Order not found",
                    "order_uid": order_uid,
                    "message": "No order exists with the given ID",
                })),
            )
                .into_response(),
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        ApiError::Internal(e)
    }
}
