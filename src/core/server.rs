// Application server configuration and setup

use std::time::Duration;
use axum::{
    Router,
    middleware::from_fn,
    extract::DefaultBodyLimit,
    error_handling::HandleErrorLayer,
};
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tokio::{signal, net::TcpListener};
use listenfd::ListenFd;
use anyhow::Result;
use tracing::{error, info};

use crate::api::{
    auth::routes::auth_routes,
    friends::routes::friend_routes,
    health::routes::health_routes,
    profile::routes::profile_routes,
    rides::routes::ride_routes,
};
use crate::config::{environment::EnvironmentVariables, state::AppState};
use crate::core::cors::CorsPolicy;
use crate::core::router::{Dispatcher, RouteError};
use crate::utils::{
    error_handler::handle_global_error,
    response_handler::response_wrapper
};

/// Collects every feature's routes. Fails on duplicate or malformed routes.
pub fn build_dispatcher() -> Result<Dispatcher, RouteError> {
    let dispatcher: Dispatcher = Dispatcher::new();
    let dispatcher: Dispatcher = health_routes(dispatcher)?;
    let dispatcher: Dispatcher = auth_routes(dispatcher)?;
    let dispatcher: Dispatcher = profile_routes(dispatcher)?;
    let dispatcher: Dispatcher = friend_routes(dispatcher)?;
    // Add new routes here
    let dispatcher: Dispatcher = ride_routes(dispatcher)?;

    Ok(dispatcher)
}

/// Builds the full route table with the JWT interceptor on the protected group
pub fn register_routes(state: &AppState) -> Result<Router<AppState>, RouteError> {
    let dispatcher: Dispatcher = build_dispatcher()?;

    info!("Registered {} routes", dispatcher.entries().len());

    Ok(dispatcher.into_router(state.token_validator()))
}

/// Creates and configures the application router with all middleware layers
pub fn create_app(state: AppState) -> Result<Router> {
    let env: &EnvironmentVariables = &state.environment;
    let cors: CorsPolicy = CorsPolicy::from_env(env)?;

    let app: Router = register_routes(&state)?
        .layer(
            ServiceBuilder::new()
                .layer(cors.layer())
                .layer(from_fn(response_wrapper))
                .layer(HandleErrorLayer::new(handle_global_error))
                .layer(TimeoutLayer::new(Duration::from_secs(env.default_timeout_seconds)))
                .layer(DefaultBodyLimit::max(env.max_request_body_size))
        )
        .with_state(state);

    Ok(app)
}

/// Sets up the TCP listener from environment or binds to new address
pub async fn setup_listener(env: &EnvironmentVariables) -> Result<TcpListener> {
    let mut listenfd: ListenFd = ListenFd::from_env();

    let listener: TcpListener = match listenfd.take_tcp_listener(0)? {
        Some(std_listener) => {
            std_listener.set_nonblocking(true)?;
            TcpListener::from_std(std_listener)?
        }
        None => {
            let addr: String = format!("{}:{}", env.host, env.port);
            TcpListener::bind(&addr).await?
        }
    };

    Ok(listener)
}

/// Handles graceful shutdown signals (Ctrl+C and TERM)
pub async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for TERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate: std::future::Pending<()> = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutting down via Ctrl+C"),
        _ = terminate => info!("Shutting down via TERM signal"),
    }

    // Gracefully close database connections
    state.shutdown().await;
}
