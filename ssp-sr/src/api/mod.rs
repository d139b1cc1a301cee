//! HTTP API for the external survey UI
//!
//! The UI is a thin collaborator: it renders what these endpoints return,
//! plays/shows the referenced assets, and posts raw inputs back. All survey
//! rules (ordering, gating, validation, timing, submission) live server-side
//! behind this surface.

pub mod health;
pub mod session;
pub mod sse;
pub mod trial;

pub use health::health;
pub use session::{begin_session, create_session, get_session};
pub use sse::event_stream;
pub use trial::{get_gate, get_trial, submit_trial};

use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::SessionEngine;
use crate::AppState;

/// Resolve a session id to its engine or 404
pub(crate) async fn lookup_session(
    state: &AppState,
    session_id: Uuid,
) -> Result<Arc<SessionEngine>, ApiError> {
    state
        .registry
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no active session {}", session_id)))
}
