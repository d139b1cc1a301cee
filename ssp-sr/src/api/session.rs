//! Session lifecycle endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use ssp_common::record::{generate_participant_id, Demographics, Gender};
use ssp_common::time;

use crate::error::ApiResult;
use crate::session::sequencer::build_trial_order;
use crate::session::{SessionEngine, SessionPhase, SessionSnapshot, SurveySession};
use crate::AppState;

use super::lookup_session;

/// Request body for POST /api/session/:id/begin
#[derive(Debug, Deserialize)]
pub struct BeginSessionRequest {
    /// Participant age in years
    pub age: u32,
    /// Gender label or free-text self-description
    pub gender: String,
}

/// Response body for POST /api/session
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub trial_count: usize,
    /// Audio ref for the consent page's volume calibration player
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_audio: Option<String>,
}

/// POST /api/session - open a session on the consent page
///
/// Draws this session's randomized trial order and registers it in
/// `AwaitingConsent`. Demographics arrive with consent at begin; nothing is
/// appended to the store until trials are submitted.
pub async fn create_session(
    State(state): State<AppState>,
) -> ApiResult<Json<CreateSessionResponse>> {
    let trials = build_trial_order(
        &state.catalog,
        state.config.survey.trials_per_participant,
        &mut rand::thread_rng(),
    );

    let min_listen_ms = (state.config.survey.min_listen_seconds * 1000) as i64;
    let session = SurveySession::new(
        Uuid::new_v4(),
        generate_participant_id(),
        trials,
        min_listen_ms,
        state.config.survey.calibration_audio.clone(),
        time::now(),
    );
    let session_id = session.id();
    let trial_count = session.trial_count();

    let engine = Arc::new(SessionEngine::new(
        session,
        state.store.clone(),
        state.retry.clone(),
        state.event_bus.clone(),
    ));
    state.registry.insert(engine).await;

    info!(%session_id, trial_count, "session created");

    Ok(Json(CreateSessionResponse {
        session_id,
        phase: SessionPhase::AwaitingConsent,
        trial_count,
        calibration_audio: state.config.survey.calibration_audio.clone(),
    }))
}

/// POST /api/session/:id/begin - affirm consent and start the first trial
///
/// Carries the participant's demographics. A rejected payload leaves the
/// session on the consent page, ready for a corrected begin.
pub async fn begin_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<BeginSessionRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let engine = lookup_session(&state, session_id).await?;
    let demographics = Demographics {
        age: request.age,
        gender: Gender::from(request.gender),
    };
    let snapshot = engine.begin(demographics).await?;
    info!(%session_id, "session began trials");
    Ok(Json(snapshot))
}

/// GET /api/session/:id - observable session state
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let engine = lookup_session(&state, session_id).await?;
    Ok(Json(engine.snapshot().await))
}
