pub mod client;
pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use services::{events::EventService, uploads::UploadService};

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub events: EventService,
    pub uploads: Arc<UploadService>,
}

impl AppState {
    /// Builds the state and resets upload storage; nothing survives a restart.
    pub async fn new(config: config::Config) -> Result<Arc<Self>, error::AppError> {
        let uploads = Arc::new(UploadService::new(config.uploads.clone()));
        uploads.reset_storage().await?;

        let events = EventService::new(store::EventStore::new(), uploads.clone());

        Ok(Arc::new(Self {
            config,
            events,
            uploads,
        }))
    }
}

/// Main router: REST surface, CORS for the frontend origin and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Calendrix API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .merge(controllers::routes(&state.uploads))
        .with_state(state.clone())
        .layer(middleware::cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
}
