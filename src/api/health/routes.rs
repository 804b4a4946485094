// Health route definitions

use axum::http::Method;

use crate::core::router::{Access, Dispatcher, RouteError};
use super::handler;

/// Registers the unauthenticated liveness endpoint
pub fn health_routes(dispatcher: Dispatcher) -> Result<Dispatcher, RouteError> {
    dispatcher.route(Method::GET, "/health", handler::health_handler, Access::Public)
}
