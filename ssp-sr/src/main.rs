//! ssp-sr - Soundscape Survey Runner
//!
//! Runs single-session perceptual surveys: each participant views a visual
//! scene while listening to its soundscape, then rates comfort, pleasantness,
//! appropriateness, and per-category satisfaction. This service owns the
//! trial state machine, minimum-exposure gating, reaction-time measurement,
//! and exactly-once submission to an external append-only row store. The
//! participant-facing UI is a separate, thin client of the HTTP API.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ssp_common::config::{resolve_config_path, resolve_store_token, SurveyConfig};
use ssp_common::events::EventBus;
use ssp_common::record::ResponseRecord;
use ssp_sr::store::HttpRowStore;
use ssp_sr::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "ssp-sr", version, about = "Soundscape survey runner service")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the store header row as JSON and exit
    ///
    /// Operators use this to initialize a fresh sheet with the exact column
    /// order rows will be appended in.
    #[arg(long)]
    print_header: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_header {
        println!("{}", serde_json::to_string(&ResponseRecord::header())?);
        return Ok(());
    }

    let config_path = resolve_config_path(args.config.as_deref());
    let config = SurveyConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {:?}", config_path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting Soundscape Survey Runner (ssp-sr) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Config: {}", config_path.display());

    let catalog = config.catalog()?;
    info!(
        "Stimulus catalog: {} entries, {} trials per participant, {}s minimum listen",
        catalog.len(),
        config.survey.trials_per_participant,
        config.survey.min_listen_seconds
    );

    let token = resolve_store_token(&config.store)?;
    let store = HttpRowStore::new(
        &config.store.endpoint,
        &token,
        std::time::Duration::from_secs(config.store.request_timeout_seconds),
    )?;
    info!("Store endpoint: {}", config.store.endpoint);

    let event_bus = EventBus::new(256);
    let port = args.port.unwrap_or(config.port);

    let state = AppState::new(config, catalog, Arc::new(store), event_bus);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
