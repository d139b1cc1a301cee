//! Configuration loading and validation
//!
//! TOML bootstrap configuration: server port, logging, survey parameters,
//! store endpoint, retry policy, and the stimulus catalog. These settings
//! cannot change during runtime; the process must restart to pick up edits.
//!
//! # Config file resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `SSP_CONFIG` environment variable
//! 3. OS config directory (`<config dir>/ssp/ssp.toml`)
//!
//! Store credentials are deliberately NOT part of this file: the store client
//! receives an already-minted bearer token resolved from an environment
//! variable or token file (see [`resolve_store_token`]); how that token was
//! acquired is external and opaque to this process.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::catalog::{Catalog, StimulusDescriptor};
use crate::{Error, Result};

/// Environment variable naming the config file path
pub const CONFIG_ENV_VAR: &str = "SSP_CONFIG";

/// Complete bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Survey timing and sizing parameters
    #[serde(default)]
    pub survey: SurveySettings,

    /// External store endpoint and credential source
    pub store: StoreSettings,

    /// Submission retry policy
    #[serde(default)]
    pub retry: RetrySettings,

    /// Stimulus catalog (`[[stimuli]]` entries, in presentation-pool order)
    pub stimuli: Vec<StimulusDescriptor>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Survey timing and sizing parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SurveySettings {
    /// Trials presented per participant (clamped to the catalog size)
    #[serde(default = "default_trials_per_participant")]
    pub trials_per_participant: usize,

    /// Minimum listening time before the rating form unlocks
    #[serde(default = "default_min_listen_seconds")]
    pub min_listen_seconds: u64,

    /// Audio ref played on the consent page for volume calibration
    #[serde(default)]
    pub calibration_audio: Option<String>,
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            trials_per_participant: default_trials_per_participant(),
            min_listen_seconds: default_min_listen_seconds(),
            calibration_audio: None,
        }
    }
}

/// External store endpoint and credential source
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Append endpoint URL of the external row store
    pub endpoint: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Fallback file holding the bearer token (consulted after the env var)
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// Per-request timeout for append calls
    #[serde(default = "default_store_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

/// Submission retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total append attempts per submission (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each subsequent retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_port() -> u16 {
    5731
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_trials_per_participant() -> usize {
    3
}

fn default_min_listen_seconds() -> u64 {
    3
}

fn default_token_env() -> String {
    "SSP_STORE_TOKEN".to_string()
}

fn default_store_timeout_seconds() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    500
}

impl SurveyConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {:?}: {}", path, e))
        })?;

        let config: SurveyConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("failed to parse {:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// Any failure here is fatal at startup: no partial session is ever
    /// created from a bad configuration.
    pub fn validate(&self) -> Result<()> {
        // Catalog construction performs its own emptiness/uniqueness checks
        let catalog = Catalog::new(self.stimuli.clone())?;

        if self.survey.trials_per_participant == 0 {
            return Err(Error::Config(
                "survey.trials_per_participant must be at least 1".to_string(),
            ));
        }
        if self.survey.trials_per_participant > catalog.len() {
            warn!(
                requested = self.survey.trials_per_participant,
                catalog = catalog.len(),
                "trials_per_participant exceeds catalog size; sessions will be clamped"
            );
        }

        if self.store.endpoint.trim().is_empty() {
            return Err(Error::Config(
                "store.endpoint must not be empty".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the validated stimulus catalog
    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::new(self.stimuli.clone())
    }
}

/// Resolve the config file path by priority: CLI arg, env var, OS default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }

    default_config_path()
}

/// OS-dependent default config file path (`<config dir>/ssp/ssp.toml`)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("ssp").join("ssp.toml"))
        .unwrap_or_else(|| PathBuf::from("ssp.toml"))
}

/// Resolve the store bearer token from the configured sources
///
/// Priority: environment variable, then token file. A missing token is a
/// configuration error and halts startup before any trial begins; the token
/// itself is never logged.
pub fn resolve_store_token(store: &StoreSettings) -> Result<String> {
    if let Ok(token) = std::env::var(&store.token_env) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    if let Some(path) = &store.token_file {
        let token = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read token file {:?}: {}", path, e)))?
            .trim()
            .to_string();
        if !token.is_empty() {
            return Ok(token);
        }
        return Err(Error::Config(format!("token file {:?} is empty", path)));
    }

    Err(Error::Config(format!(
        "store token not found: set {} or configure store.token_file",
        store.token_env
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(default_port(), 5731);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_trials_per_participant(), 3);
        assert_eq!(default_min_listen_seconds(), 3);
        assert_eq!(default_max_attempts(), 4);
        assert_eq!(default_base_delay_ms(), 500);
    }

    #[test]
    fn retry_settings_default() {
        let retry = RetrySettings::default();
        assert_eq!(retry.max_attempts, 4);
        assert_eq!(retry.base_delay_ms, 500);
    }

    #[test]
    fn default_config_path_is_under_ssp() {
        let path = default_config_path();
        assert!(path.ends_with("ssp.toml") || path == PathBuf::from("ssp.toml"));
    }
}
