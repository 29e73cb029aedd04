// =============================================================================
// Application State
// =============================================================================
//
// Built once at startup and shared with the HTTP handlers via `Arc`. Holds
// the selection list and the analyzer, which owns the sheet handle.
// =============================================================================

use crate::analysis::Analyzer;
use crate::config::AppConfig;
use crate::sheets::SheetBackend;

pub struct AppState<B> {
    /// Tickers offered in the selection list; the first is the default.
    pub tickers: Vec<String>,
    pub analyzer: Analyzer<B>,
}

impl<B: SheetBackend> AppState<B> {
    pub fn new(config: &AppConfig, analyzer: Analyzer<B>) -> Self {
        Self { tickers: config.tickers.clone(), analyzer }
    }

    pub fn default_ticker(&self) -> Option<&str> {
        self.tickers.first().map(String::as_str)
    }
}
