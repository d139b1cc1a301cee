//! Current-trial endpoints: render data, gate progress, submission

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::session::{GateStatus, RawSubmission, SubmitOutcome, TrialView};
use crate::AppState;

use super::lookup_session;

/// GET /api/session/:id/trial - render data for the current trial
pub async fn get_trial(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<TrialView>> {
    let engine = lookup_session(&state, session_id).await?;
    let view = engine.trial_view().await?;
    Ok(Json(view))
}

/// GET /api/session/:id/trial/gate - exposure gate progress
///
/// The UI polls this to switch its submit control from locked to live.
pub async fn get_gate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<GateStatus>> {
    let engine = lookup_session(&state, session_id).await?;
    let status = engine.gate_status().await?;
    Ok(Json(status))
}

/// POST /api/session/:id/trial/submit - submit the current trial's responses
///
/// On success the session has already advanced (or completed); on any error
/// the trial is still current and may be submitted again.
pub async fn submit_trial(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(raw): Json<RawSubmission>,
) -> ApiResult<Json<SubmitOutcome>> {
    let engine = lookup_session(&state, session_id).await?;
    let outcome = engine.submit(raw).await?;

    info!(
        %session_id,
        trial_index = outcome.trial_index,
        reaction_time_ms = outcome.reaction_time_ms,
        completed = outcome.completed,
        "trial submitted"
    );

    Ok(Json(outcome))
}
