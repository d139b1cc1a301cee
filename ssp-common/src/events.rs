//! Event system for survey progress notifications
//!
//! Events are broadcast on an in-process bus and forwarded to observers over
//! SSE. They are advisory only: session state transitions and store writes
//! never depend on an event being delivered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted as a session moves through its trials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurveyEvent {
    /// Session left the consent page and entered its first trial
    SessionStarted {
        session_id: Uuid,
        trial_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A trial became the current trial (stimulus presented, gate running)
    TrialStarted {
        session_id: Uuid,
        trial_index: usize,
        stimulus_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A trial's response row was accepted by the external store
    TrialSubmitted {
        session_id: Uuid,
        trial_index: usize,
        stimulus_id: String,
        reaction_time_ms: i64,
        timestamp: DateTime<Utc>,
    },

    /// A submission attempt failed; the trial remains current
    SubmissionFailed {
        session_id: Uuid,
        trial_index: usize,
        reason: String,
        retryable: bool,
        timestamp: DateTime<Utc>,
    },

    /// All trials submitted; the session reached its terminal phase
    SessionCompleted {
        session_id: Uuid,
        participant_id: String,
        trials_submitted: usize,
        timestamp: DateTime<Utc>,
    },
}

impl SurveyEvent {
    /// Event type name as it appears in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            SurveyEvent::SessionStarted { .. } => "SessionStarted",
            SurveyEvent::TrialStarted { .. } => "TrialStarted",
            SurveyEvent::TrialSubmitted { .. } => "TrialSubmitted",
            SurveyEvent::SubmissionFailed { .. } => "SubmissionFailed",
            SurveyEvent::SessionCompleted { .. } => "SessionCompleted",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            SurveyEvent::SessionStarted { session_id, .. }
            | SurveyEvent::TrialStarted { session_id, .. }
            | SurveyEvent::TrialSubmitted { session_id, .. }
            | SurveyEvent::SubmissionFailed { session_id, .. }
            | SurveyEvent::SessionCompleted { session_id, .. } => *session_id,
        }
    }
}

/// Broadcast bus carrying [`SurveyEvent`]s to SSE subscribers
///
/// Slow subscribers lag, they do not block emitters. Cloning the bus is cheap
/// and shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SurveyEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create an event bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SurveyEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers
    ///
    /// Returns the number of subscribers that received the event. Zero
    /// subscribers is not an error; sessions run with or without observers.
    pub fn emit(&self, event: SurveyEvent) -> usize {
        tracing::debug!(event_type = event.event_type(), "emitting event");
        self.tx.send(event).unwrap_or(0)
    }

    /// Channel capacity the bus was created with
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
