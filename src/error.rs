//! Error types for the sheet boundary and for table parsing.

use thiserror::Error;

/// Failures talking to the spreadsheet backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    /// The request never got a response (DNS, TLS, timeout, refused).
    #[error("cannot reach the spreadsheet service: {0}")]
    Connectivity(String),

    /// Credentials missing, expired or lacking access to the spreadsheet.
    #[error("spreadsheet service rejected credentials ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other non-success response.
    #[error("spreadsheet service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// A success response whose body could not be understood.
    #[error("unexpected response from spreadsheet service: {0}")]
    InvalidResponse(String),
}

/// Problems with the table read back from the sheet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// The sheet returned no data rows.
    #[error("No data available.")]
    NoData,

    /// The header row lacks a required column.
    #[error("Required columns not found in the sheet (missing \"{0}\").")]
    MissingColumn(String),

    /// Data rows exist but none has a readable date.
    #[error("None of the {skipped} data rows has a readable date.")]
    NoUsableRows { skipped: usize },
}
