//! Common error types for SSP

use thiserror::Error;

/// Common result type for SSP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the survey runner
///
/// Store errors are split into a transient class (worth retrying inside the
/// submission pipeline) and a permanent class (surfaced immediately). All
/// other variants map onto the validation / state / configuration taxonomy.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or out-of-range participant input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Submission attempted before the exposure gate opened
    #[error("Exposure gate not ready: {elapsed_ms}ms elapsed of {required_ms}ms required")]
    GateNotReady { elapsed_ms: i64, required_ms: i64 },

    /// Operation not valid in the session's current phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Trial read past the end of the trial order
    ///
    /// Expected completion signal, not a fault: the sequencer has been
    /// exhausted and the session is (or is about to be) complete.
    #[error("Session complete: no trials remain")]
    SessionComplete,

    /// Temporary store failure (rate limit, 5xx, timeout); retried with backoff
    #[error("Transient store error: {0}")]
    StoreTransient(String),

    /// Permanent store failure (auth, schema mismatch, retry budget exhausted)
    #[error("Permanent store error: {0}")]
    StorePermanent(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the submission pipeline should retry after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::StoreTransient(_))
    }
}
