//! Plaza HTTP and WebSocket server.
//!
//! Exposes the town lifecycle as a JSON API and streams town events to
//! connected clients.

use axum::Router;

pub mod config;
pub mod credentials;
pub mod error;
pub mod routes;
pub mod state;
pub mod transport;

/// Builds the full application router.
#[must_use]
pub fn app(state: state::AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/towns", routes::towns::router())
        .with_state(state)
}
