//! Survey session management
//!
//! - `sequencer`: randomized trial order, drawn per session
//! - `gate`: minimum-exposure timer and reaction-time anchor
//! - `collector`: submission payload validation
//! - `state`: the pure session state machine
//! - `engine`: state machine plus store, retry, clock, and events
//! - `registry`: active sessions by id

pub mod collector;
pub mod engine;
pub mod gate;
pub mod registry;
pub mod sequencer;
pub mod state;

pub use collector::RawSubmission;
pub use engine::{SessionEngine, SubmitOutcome};
pub use gate::{ExposureGate, GateStatus};
pub use registry::SessionRegistry;
pub use state::{SessionPhase, SessionSnapshot, SurveySession, TrialView};
