// =============================================================================
// Application Configuration — JSON file with per-field defaults
// =============================================================================
//
// All tunables for the analysis service live here: which spreadsheet to drive,
// the formula window, indicator parameters, the fetch wait policy and the
// listen address.
//
// Every field carries `#[serde(default)]` so a partial file (or `{}`) loads
// cleanly. Saving uses an atomic tmp + rename.
//
// =============================================================================

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fetch::FetchPolicy;
use crate::indicators::{DEFAULT_EMA_SPAN, DEFAULT_RSI_WINDOW};
use crate::symbols::DEFAULT_TICKERS;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_worksheet() -> String {
    "Data".to_string()
}

fn default_driving_cell() -> String {
    "A1".to_string()
}

fn default_exchange() -> String {
    "NSE".to_string()
}

fn default_lookback_days() -> u32 {
    250
}

fn default_tickers() -> Vec<String> {
    DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect()
}

fn default_ema_span() -> usize {
    DEFAULT_EMA_SPAN
}

fn default_rsi_window() -> usize {
    DEFAULT_RSI_WINDOW
}

fn default_axis_padding() -> f64 {
    0.1
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

// =============================================================================
// AppConfig
// =============================================================================

/// Top-level configuration for the stock-scope service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // --- Spreadsheet -------------------------------------------------------

    /// ID of the spreadsheet whose worksheet evaluates the finance formula.
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Worksheet holding the formula and its output table.
    #[serde(default = "default_worksheet")]
    pub worksheet: String,

    /// Cell the formula is written into (A1 notation, without sheet name).
    #[serde(default = "default_driving_cell")]
    pub driving_cell: String,

    /// Sheets API root. Overridable for testing against a local stub.
    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,

    // --- Formula -----------------------------------------------------------

    /// Exchange prefix for the ticker (e.g. "NSE").
    #[serde(default = "default_exchange")]
    pub exchange: String,

    /// Trailing calendar days of history requested.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Tickers offered in the selection list. The first is the default.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    // --- Indicators & charts -----------------------------------------------

    #[serde(default = "default_ema_span")]
    pub ema_span: usize,

    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    /// Fraction of the close range added above and below the price axis.
    #[serde(default = "default_axis_padding")]
    pub axis_padding: f64,

    // --- Runtime -----------------------------------------------------------

    /// How long to wait for the sheet to recompute after writing the formula.
    #[serde(default)]
    pub fetch: FetchPolicy,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            worksheet: default_worksheet(),
            driving_cell: default_driving_cell(),
            sheets_base_url: default_sheets_base_url(),
            exchange: default_exchange(),
            lookback_days: default_lookback_days(),
            tickers: default_tickers(),
            ema_span: default_ema_span(),
            rsi_window: default_rsi_window(),
            axis_padding: default_axis_padding(),
            fetch: FetchPolicy::default(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            worksheet = %config.worksheet,
            tickers = config.tickers.len(),
            "config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.spreadsheet_id.trim().is_empty(),
            "spreadsheet_id is empty; set it to the ID of the sheet that evaluates the formula"
        );
        ensure!(!self.worksheet.trim().is_empty(), "worksheet must not be empty");
        ensure!(!self.driving_cell.trim().is_empty(), "driving_cell must not be empty");
        ensure!(!self.tickers.is_empty(), "tickers must list at least one symbol");
        ensure!(self.ema_span > 0, "ema_span must be at least 1");
        ensure!(self.rsi_window > 0, "rsi_window must be at least 1");
        ensure!(self.lookback_days > 0, "lookback_days must be at least 1");
        ensure!(
            self.axis_padding.is_finite() && self.axis_padding >= 0.0,
            "axis_padding must be a non-negative number"
        );
        self.fetch.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        AppConfig { spreadsheet_id: "sheet-123".into(), ..AppConfig::default() }
    }

    #[test]
    fn default_config_has_expected_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.worksheet, "Data");
        assert_eq!(cfg.driving_cell, "A1");
        assert_eq!(cfg.exchange, "NSE");
        assert_eq!(cfg.lookback_days, 250);
        assert_eq!(cfg.tickers.len(), 11);
        assert_eq!(cfg.tickers[0], "INFY");
        assert_eq!(cfg.tickers[10], "AXISBANK");
        assert_eq!(cfg.ema_span, 20);
        assert_eq!(cfg.rsi_window, 14);
        assert!((cfg.axis_padding - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.fetch, FetchPolicy::Fixed { settle_delay_ms: 5000 });
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
        assert_eq!(cfg.sheets_base_url, "https://sheets.googleapis.com");
        assert!(cfg.spreadsheet_id.is_empty());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "spreadsheet_id": "abc",
            "tickers": ["TCS"],
            "fetch": { "mode": "poll", "interval_ms": 500, "timeout_ms": 8000 }
        }"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.tickers, vec!["TCS"]);
        assert_eq!(cfg.rsi_window, 14);
        assert_eq!(cfg.fetch, FetchPolicy::Poll { interval_ms: 500, timeout_ms: 8000 });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_spreadsheet() {
        assert!(AppConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_degenerate_parameters() {
        assert!(AppConfig { tickers: vec![], ..valid() }.validate().is_err());
        assert!(AppConfig { ema_span: 0, ..valid() }.validate().is_err());
        assert!(AppConfig { rsi_window: 0, ..valid() }.validate().is_err());
        assert!(AppConfig { axis_padding: -0.5, ..valid() }.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("stock-scope-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stock_scope.json");

        let cfg = AppConfig { lookback_days: 90, ..valid() };
        cfg.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.lookback_days, 90);
        assert_eq!(loaded.spreadsheet_id, "sheet-123");
        assert!(!path.with_extension("json.tmp").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
