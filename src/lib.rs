//! Markdown memo core.
//!
//! Topics hold append-only sequences of immutable memo revisions. This crate
//! provides the revision store (in memory, SQLite, or remote over HTTP), the
//! REST server exposing it, and the client-side state model that keeps several
//! views consistent while edits and fetches race each other.

pub mod api;
pub mod app;
pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod load;
pub mod models;
pub mod search;
pub mod session;
pub mod views;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use backend::Backend;
use config::Config;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub config: Arc<Config>,
}

/// Install the process-wide tracing subscriber.
///
/// `RUST_LOG` wins over `level`. Calling this more than once is harmless.
pub fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Topics
        .route("/topics", get(api::list_topics))
        // Revisions
        .route("/topics/{topic_id}/memo", get(api::get_memo))
        .route(
            "/topics/{topic_id}/memos",
            get(api::list_memos).post(api::create_memo),
        )
        .route("/topics/{topic_id}/memos/{id}", delete(api::delete_memo))
        // Tags
        .route(
            "/topics/{topic_id}/tags",
            get(api::list_tags).post(api::add_tag),
        )
        .route("/topics/{topic_id}/tags/{tag}", delete(api::remove_tag))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
