//! Survey session state machine
//!
//! A session walks a fixed path: consent, then each trial in its randomized
//! order, then done. `SurveySession` is the pure core of that walk. It owns
//! the phase, the trial cursor, and the exposure gate; it performs no IO and
//! never reads the clock, taking `now` from its caller instead. The engine
//! wraps it with locking, store appends, and events.
//!
//! State transitions:
//!
//! ```text
//! AwaitingConsent --begin--> InTrial --advance (last trial)--> Complete
//!                               ^  |
//!                               +--+ advance (trials remain)
//! ```
//!
//! `package` does not transition. A packaged record only becomes an advance
//! after the store accepted its row, so a failed append leaves the trial
//! current and submittable again.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use ssp_common::catalog::StimulusDescriptor;
use ssp_common::record::{Demographics, ResponseRecord};
use ssp_common::{Error, Result};

use super::collector::{validate_demographics, validate_submission, RawSubmission};
use super::gate::{ExposureGate, GateStatus};

/// Phase of a survey session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Created; consent and calibration page shown; no trial yet
    AwaitingConsent,
    /// A trial is current: stimulus presented, gate running
    InTrial,
    /// All trials submitted; terminal
    Complete,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::AwaitingConsent => "awaiting_consent",
            SessionPhase::InTrial => "in_trial",
            SessionPhase::Complete => "complete",
        }
    }

    /// True for phases with no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Complete)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render data for the current trial
///
/// Everything the external UI needs to present one trial; asset resolution
/// from the refs is the UI's job.
#[derive(Debug, Clone, Serialize)]
pub struct TrialView {
    pub trial_index: usize,
    pub trial_count: usize,
    pub stimulus: StimulusDescriptor,
}

/// Observable session state at one instant
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub trial_count: usize,
    pub trials_submitted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_trial: Option<TrialView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateStatus>,
    /// Consent-page volume calibration clip; present only before trials begin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_audio: Option<String>,
    /// Present only once the session is complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One participant's pass through the survey
pub struct SurveySession {
    id: Uuid,
    participant_id: String,
    /// Captured exactly once, with consent, at `begin`
    demographics: Option<Demographics>,
    /// Randomized trial order, fixed at creation; never empty
    trials: Vec<StimulusDescriptor>,
    /// Index of the current trial; equals `trials.len()` once complete
    next_trial: usize,
    phase: SessionPhase,
    gate: ExposureGate,
    /// Calibration clip shown on the consent page
    calibration_audio: Option<String>,
    created_at: DateTime<Utc>,
}

impl SurveySession {
    /// Create a session in `AwaitingConsent` with its trial order fixed
    ///
    /// `trials` must be non-empty; the session API establishes that before
    /// construction. Demographics arrive later, with consent, at `begin`.
    pub fn new(
        id: Uuid,
        participant_id: String,
        trials: Vec<StimulusDescriptor>,
        min_listen_ms: i64,
        calibration_audio: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            participant_id,
            demographics: None,
            trials,
            next_trial: 0,
            phase: SessionPhase::AwaitingConsent,
            gate: ExposureGate::new(min_listen_ms),
            calibration_audio,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    /// Affirm consent and start the first trial
    ///
    /// The begin request carries the demographics; they are validated and
    /// captured here, exactly once. A rejected payload leaves the session in
    /// `AwaitingConsent` with nothing recorded. Starts the exposure gate at
    /// `now`; only valid from `AwaitingConsent`.
    pub fn begin(&mut self, demographics: Demographics, now: DateTime<Utc>) -> Result<TrialView> {
        if self.phase != SessionPhase::AwaitingConsent {
            return Err(Error::InvalidState(format!(
                "cannot begin a session in phase '{}'",
                self.phase
            )));
        }
        validate_demographics(&demographics)?;
        self.demographics = Some(demographics);
        self.phase = SessionPhase::InTrial;
        self.gate.start(now);
        self.current_trial()
    }

    /// The current trial's render data
    pub fn current_trial(&self) -> Result<TrialView> {
        match self.phase {
            SessionPhase::InTrial => {
                let stimulus = self
                    .trials
                    .get(self.next_trial)
                    .cloned()
                    .ok_or_else(|| Error::InvalidState("trial cursor out of range".to_string()))?;
                Ok(TrialView {
                    trial_index: self.next_trial,
                    trial_count: self.trials.len(),
                    stimulus,
                })
            }
            SessionPhase::AwaitingConsent => Err(Error::InvalidState(
                "session has not begun; no trial is current".to_string(),
            )),
            SessionPhase::Complete => Err(Error::SessionComplete),
        }
    }

    /// Exposure gate progress for the current trial
    pub fn gate_status(&self, now: DateTime<Utc>) -> Result<GateStatus> {
        match self.phase {
            SessionPhase::InTrial => Ok(self.gate.status(now)),
            SessionPhase::AwaitingConsent => Err(Error::InvalidState(
                "session has not begun; no gate is running".to_string(),
            )),
            SessionPhase::Complete => Err(Error::SessionComplete),
        }
    }

    /// Assemble the current trial's record from a raw submission
    ///
    /// Checks phase, then the gate, then validates the payload, and only then
    /// stamps time and reaction time. Takes `&self`: a rejected submission
    /// provably changes nothing.
    pub fn package(&self, raw: &RawSubmission, now: DateTime<Utc>) -> Result<ResponseRecord> {
        let view = self.current_trial()?;

        if !self.gate.is_ready(now) {
            return Err(Error::GateNotReady {
                elapsed_ms: self.gate.elapsed_ms(now),
                required_ms: self.gate.required_ms(),
            });
        }

        let validated = validate_submission(raw)?;
        // InTrial is only reachable through begin, which captures these
        let demographics = self
            .demographics
            .as_ref()
            .ok_or_else(|| Error::InvalidState("demographics were never captured".to_string()))?;
        let reaction_time_ms = self.gate.reaction_time_ms(now).unwrap_or(0);

        Ok(ResponseRecord {
            timestamp: now,
            participant_id: self.participant_id.clone(),
            trial_index: view.trial_index,
            stimulus: view.stimulus,
            age: demographics.age,
            gender: demographics.gender.clone(),
            comfort: validated.comfort,
            pleasantness: validated.pleasantness,
            appropriateness: validated.appropriateness,
            categories: validated.categories,
            reaction_time_ms,
        })
    }

    /// Move past the current trial after its row was accepted by the store
    ///
    /// Caller contract: only after a successful `package` for the current
    /// trial, while still holding exclusive access. Re-arms the gate at `now`
    /// for the next trial, or transitions to `Complete` after the last one.
    /// Only valid while a trial is in progress; the cursor never moves past
    /// the end of the order.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<SessionPhase> {
        match self.phase {
            SessionPhase::InTrial => {}
            SessionPhase::AwaitingConsent => {
                return Err(Error::InvalidState(
                    "cannot advance a session that has not begun".to_string(),
                ))
            }
            SessionPhase::Complete => return Err(Error::SessionComplete),
        }
        self.next_trial += 1;
        self.gate.reset();
        if self.next_trial >= self.trials.len() {
            self.phase = SessionPhase::Complete;
        } else {
            self.gate.start(now);
        }
        Ok(self.phase)
    }

    /// Observable state at `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase,
            trial_count: self.trials.len(),
            trials_submitted: self.next_trial.min(self.trials.len()),
            current_trial: self.current_trial().ok(),
            gate: self.gate_status(now).ok(),
            calibration_audio: (self.phase == SessionPhase::AwaitingConsent)
                .then(|| self.calibration_audio.clone())
                .flatten(),
            participant_id: self
                .phase
                .is_terminal()
                .then(|| self.participant_id.clone()),
            created_at: self.created_at,
        }
    }
}
