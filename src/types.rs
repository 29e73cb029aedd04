// =============================================================================
// Shared types used across the analysis pipeline
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

/// One row of the fetched price table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    /// `None` when the sheet cell was empty or not a number.
    pub close: Option<f64>,
}

/// Time-ordered closes for one analysis run.
///
/// Rows keep the order the data source delivered them in (ascending by date
/// for `GOOGLEFINANCE`); duplicates are not removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    records: Vec<PriceRecord>,
}

impl PriceSeries {
    pub fn new(records: Vec<PriceRecord>) -> Self {
        Self { records }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.close).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Close of the final row, if that row has one.
    pub fn last_close(&self) -> Option<f64> {
        self.records.last().and_then(|r| r.close)
    }
}

/// Severity of a message shown next to the charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A user-visible status line produced while running an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: StatusLevel::Info, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: StatusLevel::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: StatusLevel::Error, text: text.into() }
    }
}
