// Public API for integration tests and the client library

pub mod api;
pub mod client;
pub mod config;
pub mod execute;
pub mod protocol;
pub mod state;
pub mod types;
pub mod ws;

// Room fan-out lives on the hub
pub mod broadcast;

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use state::AppState;

/// Build the application router. Static files are only served when
/// `static_dir` exists; unknown paths fall back to its `index.html`.
pub fn app(state: Arc<AppState>, static_dir: &Path) -> Router {
    let router = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(api::health))
        .route("/api/rooms/new", get(api::new_room))
        .route("/api/execute", post(execute::execute_code));

    let router = if static_dir.is_dir() {
        tracing::info!("Serving static files from {}", static_dir.display());
        router.fallback_service(
            ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))),
        )
    } else {
        tracing::warn!(
            "Static directory {} not found, serving API only",
            static_dir.display()
        );
        router
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
