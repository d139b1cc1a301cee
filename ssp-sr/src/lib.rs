//! ssp-sr library interface
//!
//! Exposes the application state, router, and session machinery for
//! integration testing; the binary in `main.rs` is a thin wrapper.

pub mod api;
pub mod error;
pub mod session;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use ssp_common::catalog::Catalog;
use ssp_common::config::SurveyConfig;
use ssp_common::events::EventBus;

use crate::session::SessionRegistry;
use crate::store::{RetryPolicy, RowStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Validated bootstrap configuration
    pub config: Arc<SurveyConfig>,
    /// Stimulus catalog sessions draw their trial order from
    pub catalog: Arc<Catalog>,
    /// External row store client
    pub store: Arc<dyn RowStore>,
    /// Retry policy applied to every store append
    pub retry: RetryPolicy,
    /// Active sessions by id
    pub registry: Arc<SessionRegistry>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: SurveyConfig,
        catalog: Catalog,
        store: Arc<dyn RowStore>,
        event_bus: EventBus,
    ) -> Self {
        let retry = RetryPolicy::from_settings(&config.retry);
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            store,
            retry,
            registry: Arc::new(SessionRegistry::new()),
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/session", post(api::create_session))
        .route("/api/session/:id", get(api::get_session))
        .route("/api/session/:id/begin", post(api::begin_session))
        .route("/api/session/:id/trial", get(api::get_trial))
        .route("/api/session/:id/trial/gate", get(api::get_gate))
        .route("/api/session/:id/trial/submit", post(api::submit_trial))
        .route("/api/events", get(api::event_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
