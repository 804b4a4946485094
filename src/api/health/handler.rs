// Liveness probe

use axum::http::StatusCode;
use serde_json::json;
use tracing::instrument;

use crate::utils::response_handler::HandlerResponse;

pub const SERVICE_NAME: &str = "juno-backend";

/// Reads no state and always succeeds
#[instrument(name = "health")]
pub async fn health_handler() -> HandlerResponse {
    HandlerResponse::new(StatusCode::OK)
        .data(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "message": "Juno Backend is running!"
        }))
        .message("Service is healthy")
}
