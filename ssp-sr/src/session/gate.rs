//! Minimum-exposure gate
//!
//! Each trial starts a fresh gate when its stimulus is presented. Submission
//! is blocked until the participant has been exposed for the configured
//! minimum; the gate's unlock instant (start plus minimum) is also the anchor
//! for reaction-time measurement, so a submission 500ms after unlock reports
//! 500ms regardless of how long the minimum was.
//!
//! All methods take the current time as a parameter. The gate itself never
//! reads the clock, which keeps timing behavior fully deterministic in tests.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Gate progress as reported to the UI
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GateStatus {
    /// Milliseconds of exposure so far (0 when the gate has not started)
    pub elapsed_ms: i64,
    /// Minimum exposure required before submission unlocks
    pub required_ms: i64,
    /// True once `elapsed_ms >= required_ms`
    pub ready: bool,
}

/// Per-trial minimum-exposure timer
#[derive(Debug, Clone)]
pub struct ExposureGate {
    required_ms: i64,
    started_at: Option<DateTime<Utc>>,
}

impl ExposureGate {
    /// Create an unstarted gate with the given minimum exposure
    pub fn new(required_ms: i64) -> Self {
        Self {
            required_ms,
            started_at: None,
        }
    }

    /// Start the gate at `now`
    ///
    /// Idempotent: once started, later calls do not move the anchor. The
    /// first presentation of a stimulus is the one that counts.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Clear the gate for the next trial
    pub fn reset(&mut self) {
        self.started_at = None;
    }

    /// True once the gate has started
    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Minimum exposure in milliseconds
    pub fn required_ms(&self) -> i64 {
        self.required_ms
    }

    /// Milliseconds of exposure at `now`
    ///
    /// Zero when unstarted; clamped at zero if the wall clock moved
    /// backwards past the start anchor.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        match self.started_at {
            Some(started) => (now - started).num_milliseconds().max(0),
            None => 0,
        }
    }

    /// True when the minimum exposure has been reached (boundary inclusive)
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.is_started() && self.elapsed_ms(now) >= self.required_ms
    }

    /// The instant submission unlocks: start plus the required minimum
    ///
    /// This is the reaction-time anchor. `None` until the gate starts.
    pub fn unlock_time(&self) -> Option<DateTime<Utc>> {
        self.started_at
            .map(|started| started + Duration::milliseconds(self.required_ms))
    }

    /// Milliseconds from unlock to `now`, clamped at zero
    ///
    /// `None` until the gate starts. Meaningful as a reaction time only once
    /// the gate is ready.
    pub fn reaction_time_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        self.unlock_time()
            .map(|unlock| (now - unlock).num_milliseconds().max(0))
    }

    /// Snapshot of gate progress at `now`
    pub fn status(&self, now: DateTime<Utc>) -> GateStatus {
        GateStatus {
            elapsed_ms: self.elapsed_ms(now),
            required_ms: self.required_ms,
            ready: self.is_ready(now),
        }
    }
}
