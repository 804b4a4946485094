// Friends route definitions

use axum::http::Method;

use crate::core::router::{Access, Dispatcher, RouteError};
use super::handler;

pub fn friend_routes(dispatcher: Dispatcher) -> Result<Dispatcher, RouteError> {
    dispatcher
        .route(Method::GET, "/api/friends", handler::list_friends, Access::Protected)?
        .route(Method::POST, "/api/friends", handler::add_friend, Access::Protected)?
        .route(Method::GET, "/api/friends/requests", handler::friend_requests, Access::Protected)?
        .route(Method::POST, "/api/friends/username", handler::add_friend_by_username, Access::Protected)?
        .route(Method::GET, "/api/users/search", handler::search_users, Access::Protected)
}
