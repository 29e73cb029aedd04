// =============================================================================
// Analysis Pipeline — formula write, wait, read, indicators, charts
// =============================================================================
//
// One analysis runs at a time: the driving cell is shared, so the analyzer
// holds an async gate for the whole write/wait/read sequence. Nothing carries
// over between runs; every report is derived from the freshly read table.
//
// Failures never escape as errors. Sheet failures become `error` messages,
// unusable tables become `warning` messages, and in both cases the report
// carries no charts.
// =============================================================================

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::chart::{self, Figure};
use crate::config::AppConfig;
use crate::fetch::{self, FetchPolicy};
use crate::indicators::IndicatorSeries;
use crate::sheets::{parse_price_series, SheetBackend};
use crate::symbols::finance_formula;
use crate::types::StatusMessage;

/// The slice of [`AppConfig`] the pipeline needs.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub worksheet: String,
    pub driving_cell: String,
    pub exchange: String,
    pub lookback_days: u32,
    pub ema_span: usize,
    pub rsi_window: usize,
    pub axis_padding: f64,
    pub fetch: FetchPolicy,
}

impl From<&AppConfig> for AnalysisSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            worksheet: config.worksheet.clone(),
            driving_cell: config.driving_cell.clone(),
            exchange: config.exchange.clone(),
            lookback_days: config.lookback_days,
            ema_span: config.ema_span,
            rsi_window: config.rsi_window,
            axis_padding: config.axis_padding,
            fetch: config.fetch.clone(),
        }
    }
}

/// Everything the UI shows for one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub formula: String,
    pub messages: Vec<StatusMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_chart: Option<Figure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_chart: Option<Figure>,
    /// Rows that made it into the series.
    pub rows: usize,
    /// Rows dropped for an unreadable date.
    pub skipped_rows: usize,
}

impl AnalysisReport {
    fn new(symbol: &str, formula: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            formula,
            messages: Vec::new(),
            price_chart: None,
            rsi_chart: None,
            rows: 0,
            skipped_rows: 0,
        }
    }

    pub fn has_charts(&self) -> bool {
        self.price_chart.is_some() && self.rsi_chart.is_some()
    }
}

/// Runs analyses against an explicitly owned sheet backend.
pub struct Analyzer<B> {
    backend: B,
    settings: AnalysisSettings,
    gate: Mutex<()>,
}

impl<B: SheetBackend> Analyzer<B> {
    pub fn new(backend: B, settings: AnalysisSettings) -> Self {
        Self { backend, settings, gate: Mutex::new(()) }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetch, derive and chart `symbol`. Never fails; see the report messages.
    pub async fn analyze(&self, symbol: &str) -> AnalysisReport {
        let _guard = self.gate.lock().await;
        let s = &self.settings;

        let formula = finance_formula(&s.exchange, symbol, s.lookback_days);
        let mut report = AnalysisReport::new(symbol, formula.clone());

        // ── 1. Drive the formula cell ───────────────────────────────────
        if let Err(e) = self.backend.write_formula(&s.driving_cell, &formula).await {
            error!(symbol, error = %e, "failed to update ticker formula");
            report.messages.push(StatusMessage::error(format!(
                "Could not update the ticker formula: {e}"
            )));
            return report;
        }
        info!(symbol, formula = %formula, "ticker formula updated");
        report.messages.push(StatusMessage::info(format!(
            "Updated ticker in {}:{} formula to {formula}, fetching new data…",
            s.worksheet, s.driving_cell
        )));

        // ── 2. Wait and read back ───────────────────────────────────────
        let table = match fetch::wait_and_read(&self.backend, &s.fetch).await {
            Ok(table) => table,
            Err(e) => {
                error!(symbol, error = %e, "failed to read price table");
                report
                    .messages
                    .push(StatusMessage::error(format!("Could not read price data: {e}")));
                return report;
            }
        };

        // ── 3. Parse ────────────────────────────────────────────────────
        let parsed = match parse_price_series(&table) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(symbol, error = %e, "price table unusable");
                report.messages.push(StatusMessage::warning(e.to_string()));
                return report;
            }
        };
        report.rows = parsed.series.len();
        report.skipped_rows = parsed.skipped_rows;
        if parsed.skipped_rows > 0 {
            report.messages.push(StatusMessage::warning(format!(
                "Skipped {} row(s) with an unreadable date.",
                parsed.skipped_rows
            )));
        }

        // ── 4. Indicators & charts ──────────────────────────────────────
        let series = parsed.series;
        let indicators = IndicatorSeries::compute(&series, s.ema_span, s.rsi_window);

        let Some(price_chart) =
            chart::price_chart(symbol, &series, &indicators, s.ema_span, s.axis_padding)
        else {
            warn!(symbol, rows = series.len(), "no numeric closes");
            report
                .messages
                .push(StatusMessage::warning("No numeric Close values in the sheet."));
            return report;
        };

        if series.last_close().is_none() {
            report
                .messages
                .push(StatusMessage::warning("The latest row has no Close value."));
        }

        report.rsi_chart = Some(chart::rsi_chart(symbol, &series, &indicators));
        report.price_chart = Some(price_chart);

        info!(
            symbol,
            rows = report.rows,
            skipped = report.skipped_rows,
            charts = report.has_charts(),
            "analysis complete"
        );
        report
    }
}
