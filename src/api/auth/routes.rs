use axum::http::Method;

use crate::core::router::{Access, Dispatcher, RouteError};
use super::handler;

/// OAuth entry points are public; session endpoints need a token
pub fn auth_routes(dispatcher: Dispatcher) -> Result<Dispatcher, RouteError> {
    dispatcher
        .route(Method::GET, "/auth/google", handler::google_login, Access::Public)?
        .route(Method::GET, "/auth/google/callback", handler::google_callback, Access::Public)?
        .route(Method::GET, "/auth/me", handler::current_user, Access::Protected)?
        .route(Method::POST, "/auth/logout", handler::logout, Access::Protected)
}
