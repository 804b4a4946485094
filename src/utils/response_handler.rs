// Unified response system for consistent API responses
// Provides HandlerResponse struct and middleware for standardizing all responses

use axum::{
    body::{Body, Bytes},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE}, HeaderValue, Request, Response,
        response::Parts, StatusCode,
    },
    Json,
    middleware::Next,
    response::IntoResponse,
};
use chrono::Utc;
use http_body_util::BodyExt;
use tracing::{debug, error};
use std::convert::Infallible;
use serde_json::{json, Value};
use serde::{Serialize, Deserialize};

/// Standard JSON response format for all API endpoints
#[derive(Serialize, Deserialize)]
pub struct ResponseFormat {
    pub status: String,          // HTTP status text (e.g. "OK", "NOT_FOUND")
    pub code: u16,               // HTTP status code
    pub data: serde_json::Value, // Response payload
    pub messages: Vec<String>,   // Informational messages
    pub date: String,            // ISO timestamp
}

/// Convenience struct for building responses in handlers
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status_code: StatusCode,
    pub data: serde_json::Value,
    pub messages: Vec<String>,
}

impl HandlerResponse {
    /// Creates a new response with specified status code
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            data: serde_json::Value::Null,
            messages: Vec::new(),
        }
    }

    /// Adds JSON data payload to the response
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Adds an informational message to the response
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response: Response<Body> = Json(json!({
            "data": self.data,
            "messages": self.messages
        })).into_response();

        *response.status_mut() = self.status_code;

        // Store HandlerResponse in extensions for middleware processing
        response.extensions_mut().insert(self);
        response
    }
}

/// Formats a status as its upper-snake reason phrase, e.g. "NOT_FOUND"
pub fn status_label(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN STATUS")
        .to_uppercase()
        .replace(' ', "_")
}

/// Machine-readable error kind for a status, e.g. "payload_too_large".
/// 5xx collapse to "internal_error" so server details stay opaque.
pub fn error_kind(status: StatusCode) -> String {
    if status.is_server_error() {
        return "internal_error".to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("error")
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Pulls data and messages out of the response.
/// Responses that did not come from a HandlerResponse (framework
/// rejections, plain text) keep their body text as a message.
async fn extract_response_components(response: Response<Body>) -> (Parts, Vec<String>, Value) {
    let (parts, body) = response.into_parts();

    if let Some(r) = parts.extensions.get::<HandlerResponse>() {
        let (messages, data) = (r.messages.clone(), r.data.clone());
        return (parts, messages, data);
    }

    let bytes: Bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!("Failed to read response body: {}", err);
            Bytes::new()
        }
    };

    let text: String = String::from_utf8_lossy(&bytes).trim().to_string();
    let messages: Vec<String> = if text.is_empty() { Vec::new() } else { vec![text] };

    (parts, messages, Value::Null)
}

/// Logs the formatted response with proper JSON indentation
fn log_formatted_response(wrapped: &ResponseFormat) {
    match serde_json::to_string_pretty(wrapped) {
        Ok(spaced_json) => debug!("\nFinal response:\n{}", spaced_json),
        Err(err) => error!("Failed to format response JSON: {:?}", err),
    }
}

/// Builds the final response with JSON content type
fn build_final_response(parts: Parts, wrapped: &ResponseFormat) -> Response<Body> {
    let json_body: Vec<u8> = serde_json::to_vec(wrapped).unwrap_or_else(|_| b"{}".to_vec());
    let mut new_parts: Parts = parts;

    new_parts.headers.remove(CONTENT_LENGTH);
    new_parts.headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Response::from_parts(new_parts, Body::from(json_body))
}

/// Middleware that wraps all responses in the standard ResponseFormat structure
pub async fn response_wrapper(
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, Infallible> {
    let response: Response<Body> = next.run(req).await;

    let (parts, messages, mut data) = extract_response_components(response).await;

    // Error bodies always carry a kind, including framework rejections
    if data.is_null() && (parts.status.is_client_error() || parts.status.is_server_error()) {
        data = json!({ "error": error_kind(parts.status) });
    }

    let wrapped: ResponseFormat = ResponseFormat {
        status: status_label(parts.status),
        code: parts.status.as_u16(),
        data,
        messages,
        date: Utc::now().to_rfc3339(),
    };

    log_formatted_response(&wrapped);

    Ok(build_final_response(parts, &wrapped))
}
