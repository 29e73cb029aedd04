// =============================================================================
// Spreadsheet backend
// =============================================================================
//
// The spreadsheet is the external data source: a formula written into the
// driving cell is evaluated by the backend, which fills the worksheet with
// the result table. `SheetBackend` is the narrow seam the analyzer talks to;
// `SheetsClient` is the Google Sheets implementation.

pub mod client;
pub mod table;

use std::future::Future;

use crate::error::SheetError;

pub use client::SheetsClient;
pub use table::{parse_price_series, Table};

/// Write-formula / read-table access to one worksheet.
pub trait SheetBackend: Send + Sync {
    /// Set the formula of `cell` (A1 notation, without the sheet name).
    fn write_formula(
        &self,
        cell: &str,
        formula: &str,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    /// Read every populated row of the worksheet, header first.
    fn read_table(&self) -> impl Future<Output = Result<Table, SheetError>> + Send;
}
