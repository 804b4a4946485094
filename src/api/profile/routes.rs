// Profile route definitions

use axum::http::Method;

use crate::core::router::{Access, Dispatcher, RouteError};
use super::handler;

pub fn profile_routes(dispatcher: Dispatcher) -> Result<Dispatcher, RouteError> {
    dispatcher
        .route(Method::GET, "/api/profile", handler::get_profile, Access::Protected)?
        .route(Method::PUT, "/api/profile", handler::update_profile, Access::Protected)
}
