//! Session engine
//!
//! Wraps the pure [`SurveySession`] state machine with everything effectful:
//! the clock, the store append with retry, and event emission. One engine per
//! active session.
//!
//! Exactly-once submission rests on a single mechanism: the session mutex is
//! held from the phase/gate checks through the store append to the advance.
//! Two concurrent submits for the same session serialize here; whichever runs
//! second sees the advanced state and is rejected by the state machine, so no
//! trial's row can be appended twice.

use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use serde::Serialize;
use ssp_common::events::{EventBus, SurveyEvent};
use ssp_common::record::Demographics;
use ssp_common::time;
use ssp_common::Result;

use crate::store::{append_with_retry, RetryPolicy, RowStore};

use super::collector::RawSubmission;
use super::gate::GateStatus;
use super::state::{SessionSnapshot, SurveySession, TrialView};

/// Result of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub trial_index: usize,
    pub stimulus_id: String,
    pub reaction_time_ms: i64,
    pub completed: bool,
    /// Present when this submission completed the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
}

/// One active session with its effectful collaborators
pub struct SessionEngine {
    id: Uuid,
    session: Mutex<SurveySession>,
    store: Arc<dyn RowStore>,
    retry: RetryPolicy,
    events: EventBus,
}

impl SessionEngine {
    pub fn new(
        session: SurveySession,
        store: Arc<dyn RowStore>,
        retry: RetryPolicy,
        events: EventBus,
    ) -> Self {
        Self {
            id: session.id(),
            session: Mutex::new(session),
            store,
            retry,
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Affirm consent with the participant's demographics and start the
    /// first trial
    pub async fn begin(&self, demographics: Demographics) -> Result<SessionSnapshot> {
        let mut session = self.session.lock().await;
        let now = time::now();
        let view = session.begin(demographics, now)?;

        self.events.emit(SurveyEvent::SessionStarted {
            session_id: self.id,
            trial_count: view.trial_count,
            timestamp: now,
        });
        self.events.emit(SurveyEvent::TrialStarted {
            session_id: self.id,
            trial_index: view.trial_index,
            stimulus_id: view.stimulus.id.clone(),
            timestamp: now,
        });

        Ok(session.snapshot(now))
    }

    /// Observable session state
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot(time::now())
    }

    /// Render data for the current trial
    pub async fn trial_view(&self) -> Result<TrialView> {
        self.session.lock().await.current_trial()
    }

    /// Exposure gate progress for the current trial
    pub async fn gate_status(&self) -> Result<GateStatus> {
        self.session.lock().await.gate_status(time::now())
    }

    /// Submit the current trial's responses
    ///
    /// Packages the record, appends it to the store (with retry), and only
    /// then advances. A failed append leaves the trial current; the same
    /// submission can be retried without losing anything.
    pub async fn submit(&self, raw: RawSubmission) -> Result<SubmitOutcome> {
        let mut session = self.session.lock().await;
        let now = time::now();
        let record = session.package(&raw, now)?;
        let row = record.to_row();

        if let Err(e) = append_with_retry(self.store.as_ref(), &row, &self.retry).await {
            self.events.emit(SurveyEvent::SubmissionFailed {
                session_id: self.id,
                trial_index: record.trial_index,
                reason: e.to_string(),
                retryable: e.is_transient(),
                timestamp: time::now(),
            });
            return Err(e);
        }

        // Fresh instant: retries may have taken seconds, and the next
        // trial's gate must not be charged for them
        let now = time::now();
        let phase = session.advance(now)?;

        self.events.emit(SurveyEvent::TrialSubmitted {
            session_id: self.id,
            trial_index: record.trial_index,
            stimulus_id: record.stimulus.id.clone(),
            reaction_time_ms: record.reaction_time_ms,
            timestamp: now,
        });

        let completed = phase.is_terminal();
        if completed {
            self.events.emit(SurveyEvent::SessionCompleted {
                session_id: self.id,
                participant_id: record.participant_id.clone(),
                trials_submitted: session.trial_count(),
                timestamp: now,
            });
        } else if let Ok(view) = session.current_trial() {
            self.events.emit(SurveyEvent::TrialStarted {
                session_id: self.id,
                trial_index: view.trial_index,
                stimulus_id: view.stimulus.id.clone(),
                timestamp: now,
            });
        }

        Ok(SubmitOutcome {
            trial_index: record.trial_index,
            stimulus_id: record.stimulus.id.clone(),
            reaction_time_ms: record.reaction_time_ms,
            completed,
            participant_id: completed.then(|| record.participant_id.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ssp_common::catalog::StimulusDescriptor;
    use ssp_common::record::{Demographics, Gender, SoundCategory};
    use ssp_common::Error;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// In-memory store with an optional script of failures to emit first
    struct TestStore {
        failures: StdMutex<VecDeque<Error>>,
        rows: StdMutex<Vec<Vec<String>>>,
    }

    impl TestStore {
        fn new() -> Arc<Self> {
            Self::failing_with(vec![])
        }

        fn failing_with(failures: Vec<Error>) -> Arc<Self> {
            Arc::new(Self {
                failures: StdMutex::new(failures.into()),
                rows: StdMutex::new(Vec::new()),
            })
        }

        fn rows(&self) -> Vec<Vec<String>> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RowStore for TestStore {
        async fn append_row(&self, row: &[String]) -> Result<()> {
            if let Some(err) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            self.rows.lock().unwrap().push(row.to_vec());
            Ok(())
        }
    }

    fn stimuli(n: usize) -> Vec<StimulusDescriptor> {
        (1..=n)
            .map(|i| StimulusDescriptor {
                id: format!("S{:02}", i),
                visual_ref: format!("i_{:02}.jpg", i),
                audio_ref: format!("a_{:02}.wav", i),
            })
            .collect()
    }

    fn engine(store: Arc<TestStore>, trials: usize, min_listen_ms: i64) -> SessionEngine {
        let session = SurveySession::new(
            Uuid::new_v4(),
            "P_654321".to_string(),
            stimuli(trials),
            min_listen_ms,
            None,
            time::now(),
        );
        SessionEngine::new(
            session,
            store,
            RetryPolicy::new(3, Duration::from_millis(1)),
            EventBus::new(64),
        )
    }

    fn demo() -> Demographics {
        Demographics {
            age: 41,
            gender: Gender::Male,
        }
    }

    fn raw() -> RawSubmission {
        let mut satisfaction = HashMap::new();
        satisfaction.insert(SoundCategory::Water, 0.75);
        RawSubmission {
            comfort: 0.5,
            pleasantness: 0.5,
            appropriateness: 0.5,
            heard: vec![SoundCategory::Water],
            satisfaction,
        }
    }

    #[tokio::test]
    async fn submit_before_begin_is_rejected() {
        let store = TestStore::new();
        let engine = engine(store.clone(), 2, 0);

        let err = engine.submit(raw()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn full_session_appends_one_row_per_trial() {
        let store = TestStore::new();
        let engine = engine(store.clone(), 2, 0);

        engine.begin(demo()).await.unwrap();

        let first = engine.submit(raw()).await.unwrap();
        assert_eq!(first.trial_index, 0);
        assert!(!first.completed);
        assert!(first.participant_id.is_none());

        let second = engine.submit(raw()).await.unwrap();
        assert_eq!(second.trial_index, 1);
        assert!(second.completed);
        assert_eq!(second.participant_id.as_deref(), Some("P_654321"));

        let rows = store.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2], "0");
        assert_eq!(rows[1][2], "1");

        // Terminal: further submits are rejected without touching the store
        let err = engine.submit(raw()).await.unwrap_err();
        assert!(matches!(err, Error::SessionComplete));
        assert_eq!(store.rows().len(), 2);
    }

    #[tokio::test]
    async fn gate_blocks_submission_and_store_stays_untouched() {
        let store = TestStore::new();
        let engine = engine(store.clone(), 2, 60_000);

        engine.begin(demo()).await.unwrap();
        let err = engine.submit(raw()).await.unwrap_err();
        assert!(matches!(err, Error::GateNotReady { .. }));
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn transient_failure_retries_within_one_submit() {
        let store = TestStore::failing_with(vec![Error::StoreTransient("HTTP 503".into())]);
        let engine = engine(store.clone(), 1, 0);

        engine.begin(demo()).await.unwrap();
        let outcome = engine.submit(raw()).await.unwrap();
        assert!(outcome.completed);
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn failed_append_keeps_trial_current_for_resubmission() {
        let store = TestStore::failing_with(vec![Error::StorePermanent("HTTP 403".into())]);
        let engine = engine(store.clone(), 1, 0);

        engine.begin(demo()).await.unwrap();
        let err = engine.submit(raw()).await.unwrap_err();
        assert!(!err.is_transient());
        assert!(store.rows().is_empty());

        let snap = engine.snapshot().await;
        assert_eq!(snap.trials_submitted, 0);
        assert!(snap.current_trial.is_some());

        // Store recovered; the same trial submits cleanly
        let outcome = engine.submit(raw()).await.unwrap();
        assert_eq!(outcome.trial_index, 0);
        assert!(outcome.completed);
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn failed_append_preserves_the_reaction_time_anchor() {
        let store = TestStore::failing_with(vec![Error::StorePermanent("HTTP 403".into())]);
        let engine = engine(store.clone(), 1, 200);

        engine.begin(demo()).await.unwrap();

        // Past the gate; the append fails and the trial stays current
        tokio::time::sleep(Duration::from_millis(260)).await;
        let err = engine.submit(raw()).await.unwrap_err();
        assert!(matches!(err, Error::StorePermanent(_)));

        // Resubmission measures from the original unlock; a gate re-armed at
        // the failure would still be blocking here
        tokio::time::sleep(Duration::from_millis(140)).await;
        let outcome = engine.submit(raw()).await.unwrap();
        assert!(outcome.reaction_time_ms >= 200);
        assert!(outcome.reaction_time_ms < 400);

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][31], outcome.reaction_time_ms.to_string());
    }

    #[tokio::test]
    async fn events_trace_the_session_lifecycle() {
        let store = TestStore::new();
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();

        let session = SurveySession::new(
            Uuid::new_v4(),
            "P_000001".to_string(),
            stimuli(1),
            0,
            None,
            time::now(),
        );
        let engine = SessionEngine::new(
            session,
            store,
            RetryPolicy::new(1, Duration::from_millis(1)),
            bus,
        );

        engine.begin(demo()).await.unwrap();
        engine.submit(raw()).await.unwrap();

        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            types.push(event.event_type());
        }
        assert_eq!(
            types,
            vec![
                "SessionStarted",
                "TrialStarted",
                "TrialSubmitted",
                "SessionCompleted"
            ]
        );
    }
}
