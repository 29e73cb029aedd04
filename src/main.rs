// =============================================================================
// stock-scope — Main Entry Point
// =============================================================================
//
// Serves the analysis UI. Each request writes a GOOGLEFINANCE formula into
// the configured worksheet, waits, reads the table back and returns EMA/RSI
// charts. Analyses run one at a time on a single-threaded runtime.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod chart;
mod config;
mod error;
mod fetch;
mod indicators;
mod sheets;
mod symbols;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::{AnalysisSettings, Analyzer};
use crate::app_state::AppState;
use crate::config::AppConfig;
use crate::sheets::SheetsClient;

const CONFIG_PATH: &str = "stock_scope.json";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("stock-scope starting up");

    let config = AppConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let config = AppConfig::default();
        if !Path::new(CONFIG_PATH).exists() {
            match config.save(CONFIG_PATH) {
                Ok(()) => info!(path = CONFIG_PATH, "wrote starter config; set spreadsheet_id"),
                Err(e) => warn!(error = %e, "could not write starter config"),
            }
        }
        config
    });
    config.validate().context("invalid configuration")?;

    info!(
        worksheet = %config.worksheet,
        cell = %config.driving_cell,
        fetch = ?config.fetch,
        "Configured data source"
    );

    // ── 2. Data source handle ────────────────────────────────────────────
    let access_token = std::env::var("GOOGLE_SHEETS_ACCESS_TOKEN").unwrap_or_default();
    if access_token.is_empty() {
        warn!("GOOGLE_SHEETS_ACCESS_TOKEN is not set — sheet requests will be rejected");
    }
    let client = SheetsClient::new(
        &config.sheets_base_url,
        config.spreadsheet_id.clone(),
        config.worksheet.clone(),
        &access_token,
    )?;

    // ── 3. Shared state ──────────────────────────────────────────────────
    let analyzer = Analyzer::new(client, AnalysisSettings::from(&config));
    let state = Arc::new(AppState::new(&config, analyzer));

    // ── 4. HTTP server ───────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "API server listening");

    axum::serve(listener, api::rest::router(state))
        .await
        .context("API server failed")?;

    Ok(())
}
