// Start of file: src/main.rs

use std::sync::Arc;
use axum::{Router, serve};
use tokio::net::TcpListener;
use tracing::info;

use juno_backend::auth::{GoogleOAuth, OAuthProvider};
use juno_backend::config::environment::{EnvironmentVariables, StorageBackend};
use juno_backend::config::state::AppState;
use juno_backend::core::{logging::init_tracing, server};
use juno_backend::database::{MemoryRepository, PostgresRepository, Repository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // set up logging
    init_tracing();

    let env: Arc<EnvironmentVariables> = Arc::new(EnvironmentVariables::load()?);
    info!("Starting in {} mode", env.environment);

    // * Storage is chosen once and injected
    let repository: Arc<dyn Repository> = match env.storage_backend {
        StorageBackend::Postgres => {
            let postgres: PostgresRepository = PostgresRepository::new(env.clone());
            postgres.initialize().await?;
            Arc::new(postgres)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage, data is lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    let oauth: Arc<dyn OAuthProvider> = Arc::new(GoogleOAuth::from_env(&env)?);
    let state: AppState = AppState::new(env.clone(), repository, oauth);

    let app: Router = server::create_app(state.clone())?;
    let listener: TcpListener = server::setup_listener(&env).await?;

    info!("Server listening on: {}://{}", env.protocol, listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal(state))
        .await?;

    Ok(())
}

// End of file: src/main.rs
