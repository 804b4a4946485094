// Ride route definitions

use axum::http::Method;

use crate::core::router::{Access, Dispatcher, RouteError};
use super::handler;

/// `/api/rides/nearby` is static and wins over `/api/rides/:id`
pub fn ride_routes(dispatcher: Dispatcher) -> Result<Dispatcher, RouteError> {
    dispatcher
        .route(Method::GET, "/api/rides", handler::list_rides, Access::Protected)?
        .route(Method::POST, "/api/rides", handler::create_ride, Access::Protected)?
        .route(Method::GET, "/api/rides/nearby", handler::nearby_rides, Access::Protected)?
        .route(Method::GET, "/api/rides/:id", handler::ride_detail, Access::Protected)?
        .route(Method::POST, "/api/rides/:id/join", handler::join_ride, Access::Protected)?
        .route(Method::DELETE, "/api/rides/:id/leave", handler::leave_ride, Access::Protected)?
        .route(Method::POST, "/api/rides/:id/cancel", handler::cancel_ride, Access::Protected)
}
