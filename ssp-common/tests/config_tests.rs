//! Integration tests for configuration loading, validation, and resolution

use serial_test::serial;
use ssp_common::config::{
    resolve_config_path, resolve_store_token, StoreSettings, SurveyConfig, CONFIG_ENV_VAR,
};
use ssp_common::Error;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("ssp.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

const FULL_CONFIG: &str = r#"
port = 8080

[logging]
level = "debug"

[survey]
trials_per_participant = 2
min_listen_seconds = 5
calibration_audio = "pink_noise.wav"

[store]
endpoint = "https://rows.example.org/append"
token_env = "MY_TOKEN"
request_timeout_seconds = 30

[retry]
max_attempts = 6
base_delay_ms = 250

[[stimuli]]
id = "S01"
visual_ref = "i_qeop_3.jpg"
audio_ref = "a_3_garden.wav"

[[stimuli]]
id = "S02"
visual_ref = "i_qeop_2.jpg"
audio_ref = "a_2_canal.wav"
"#;

const MINIMAL_CONFIG: &str = r#"
[store]
endpoint = "https://rows.example.org/append"

[[stimuli]]
id = "S01"
visual_ref = "i.jpg"
audio_ref = "a.wav"
"#;

#[test]
fn loads_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG);

    let config = SurveyConfig::load(&path).unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.survey.trials_per_participant, 2);
    assert_eq!(config.survey.min_listen_seconds, 5);
    assert_eq!(
        config.survey.calibration_audio.as_deref(),
        Some("pink_noise.wav")
    );
    assert_eq!(config.store.endpoint, "https://rows.example.org/append");
    assert_eq!(config.store.token_env, "MY_TOKEN");
    assert_eq!(config.store.request_timeout_seconds, 30);
    assert_eq!(config.retry.max_attempts, 6);
    assert_eq!(config.retry.base_delay_ms, 250);
    assert_eq!(config.stimuli.len(), 2);
}

#[test]
fn minimal_config_applies_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, MINIMAL_CONFIG);

    let config = SurveyConfig::load(&path).unwrap();
    assert_eq!(config.port, 5731);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.survey.trials_per_participant, 3);
    assert_eq!(config.survey.min_listen_seconds, 3);
    assert!(config.survey.calibration_audio.is_none());
    assert_eq!(config.store.token_env, "SSP_STORE_TOKEN");
    assert!(config.store.token_file.is_none());
    assert_eq!(config.store.request_timeout_seconds, 15);
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.retry.base_delay_ms, 500);
}

#[test]
fn catalog_builds_from_loaded_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG);

    let config = SurveyConfig::load(&path).unwrap();
    let catalog = config.catalog().unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.stimuli()[0].id, "S01");
}

#[test]
fn missing_file_is_config_error() {
    let err = SurveyConfig::load(Path::new("/nonexistent/ssp.toml")).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn missing_store_section_fails_to_parse() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[[stimuli]]
id = "S01"
visual_ref = "i.jpg"
audio_ref = "a.wav"
"#,
    );
    let err = SurveyConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn empty_stimuli_list_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
stimuli = []

[store]
endpoint = "https://rows.example.org/append"
"#,
    );
    let err = SurveyConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("catalog"));
}

#[test]
fn duplicate_stimulus_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let config = MINIMAL_CONFIG.to_string()
        + r#"
[[stimuli]]
id = "S01"
visual_ref = "other.jpg"
audio_ref = "other.wav"
"#;
    let path = write_config(&dir, &config);
    let err = SurveyConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn zero_trials_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = MINIMAL_CONFIG.replace(
        "[store]",
        "[survey]\ntrials_per_participant = 0\n\n[store]",
    );
    let path = write_config(&dir, &config);
    let err = SurveyConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("trials_per_participant"));
}

#[test]
fn zero_retry_attempts_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = MINIMAL_CONFIG.replace("[store]", "[retry]\nmax_attempts = 0\n\n[store]");
    let path = write_config(&dir, &config);
    let err = SurveyConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("max_attempts"));
}

#[test]
fn blank_endpoint_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = MINIMAL_CONFIG.replace(
        "endpoint = \"https://rows.example.org/append\"",
        "endpoint = \"  \"",
    );
    let path = write_config(&dir, &config);
    let err = SurveyConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("endpoint"));
}

#[test]
#[serial]
fn config_path_prefers_cli_argument() {
    std::env::set_var(CONFIG_ENV_VAR, "/from/env/ssp.toml");
    let resolved = resolve_config_path(Some(Path::new("/from/cli/ssp.toml")));
    std::env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(resolved, PathBuf::from("/from/cli/ssp.toml"));
}

#[test]
#[serial]
fn config_path_falls_back_to_env_var() {
    std::env::set_var(CONFIG_ENV_VAR, "/from/env/ssp.toml");
    let resolved = resolve_config_path(None);
    std::env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(resolved, PathBuf::from("/from/env/ssp.toml"));
}

#[test]
#[serial]
fn config_path_defaults_when_unset() {
    std::env::remove_var(CONFIG_ENV_VAR);
    let resolved = resolve_config_path(None);
    assert!(resolved.ends_with("ssp.toml"));
}

fn store_settings(token_env: &str, token_file: Option<PathBuf>) -> StoreSettings {
    StoreSettings {
        endpoint: "https://rows.example.org/append".to_string(),
        token_env: token_env.to_string(),
        token_file,
        request_timeout_seconds: 15,
    }
}

#[test]
#[serial]
fn store_token_from_env_var() {
    std::env::set_var("SSP_TEST_TOKEN_A", "secret-token");
    let token = resolve_store_token(&store_settings("SSP_TEST_TOKEN_A", None)).unwrap();
    std::env::remove_var("SSP_TEST_TOKEN_A");
    assert_eq!(token, "secret-token");
}

#[test]
#[serial]
fn store_token_from_file_when_env_missing() {
    std::env::remove_var("SSP_TEST_TOKEN_B");
    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "  file-token\n").unwrap();

    let token =
        resolve_store_token(&store_settings("SSP_TEST_TOKEN_B", Some(token_path))).unwrap();
    assert_eq!(token, "file-token");
}

#[test]
#[serial]
fn empty_token_file_is_config_error() {
    std::env::remove_var("SSP_TEST_TOKEN_C");
    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "\n").unwrap();

    let err =
        resolve_store_token(&store_settings("SSP_TEST_TOKEN_C", Some(token_path))).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn missing_token_names_the_env_var() {
    std::env::remove_var("SSP_TEST_TOKEN_D");
    let err = resolve_store_token(&store_settings("SSP_TEST_TOKEN_D", None)).unwrap_err();
    assert!(err.to_string().contains("SSP_TEST_TOKEN_D"));
}
