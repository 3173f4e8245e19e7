//! Plaza town server entry point.

use std::error::Error;
use std::sync::Arc;

use plaza_api::config::ApiConfig;
use plaza_api::credentials::HashedCredentialProvider;
use plaza_api::state::AppState;
use plaza_core::clock::SystemClock;
use plaza_core::rng::SystemRng;
use plaza_town::application::registry::TownsStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Plaza town server");

    let config = ApiConfig::from_env()?;

    // Build application state.
    let credentials = HashedCredentialProvider::new(config.credential_secret.clone())?;
    let towns = TownsStore::new(Box::new(SystemRng::new()), config.demo_town_id.clone());
    let app_state = AppState::new(
        Arc::new(towns),
        Arc::new(SystemClock),
        Arc::new(credentials),
    );

    // TODO: Replace CorsLayer::permissive() with the deployed client origin.
    let app = plaza_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
