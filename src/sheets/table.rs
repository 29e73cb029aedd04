// =============================================================================
// Sheet Table — raw cell grid and conversion into a PriceSeries
// =============================================================================
//
// The first row is the header; every later row is a record keyed by those
// header names. Rows shorter than the header are padded with empty cells.
//
// Column coercion:
//   Date  — a spreadsheet serial day number (what the client requests), or
//           text in "%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M", "%m/%d/%Y",
//           "%Y-%m-%d %H:%M:%S", "%Y-%m-%d". Rows with an unreadable date
//           are skipped and counted.
//   Close — numbers pass through; text is trimmed and thousands separators
//           removed before parsing; anything else is missing.
// =============================================================================

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

use crate::error::DataError;
use crate::types::{PriceRecord, PriceSeries};

pub const DATE_COLUMN: &str = "Date";
pub const CLOSE_COLUMN: &str = "Close";

const DATETIME_FORMATS: [&str; 3] = ["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

static EMPTY: Cell = Cell::Empty;

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::String(s) if s.is_empty() => Cell::Empty,
            Value::String(s) => Cell::Text(s),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::Bool(b) => Cell::Bool(b),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl Cell {
    fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.trim()),
            _ => None,
        }
    }

    /// Interpret the cell as a calendar date.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Number(serial) => serial_to_date(*serial),
            Cell::Text(s) => parse_date_text(s.trim()),
            _ => None,
        }
    }

    /// Interpret the cell as a price; `None` for anything non-numeric.
    pub fn to_price(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Every row of the worksheet, header first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Build from the `values` array of a Sheets API value range.
    pub fn from_values(values: Vec<Vec<Value>>) -> Self {
        Self::new(
            values
                .into_iter()
                .map(|row| row.into_iter().map(Cell::from).collect())
                .collect(),
        )
    }

    pub fn header(&self) -> &[Cell] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Position of the header cell named `name` (surrounding spaces ignored).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header().iter().position(|c| c.as_text() == Some(name))
    }

    /// Whether the header names both price columns and data rows follow.
    pub fn has_price_data(&self) -> bool {
        !self.data_rows().is_empty()
            && self.column_index(DATE_COLUMN).is_some()
            && self.column_index(CLOSE_COLUMN).is_some()
    }

    /// Cell at `column` of a data row, padding short rows with empties.
    fn cell<'a>(row: &'a [Cell], column: usize) -> &'a Cell {
        row.get(column).unwrap_or(&EMPTY)
    }
}

/// A parsed series plus the number of rows dropped for unreadable dates.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSeries {
    pub series: PriceSeries,
    pub skipped_rows: usize,
}

/// Convert the table read back from the sheet into a [`PriceSeries`].
pub fn parse_price_series(table: &Table) -> Result<ParsedSeries, DataError> {
    let rows = table.data_rows();
    if rows.is_empty() {
        return Err(DataError::NoData);
    }

    let date_col = table
        .column_index(DATE_COLUMN)
        .ok_or_else(|| DataError::MissingColumn(DATE_COLUMN.to_string()))?;
    let close_col = table
        .column_index(CLOSE_COLUMN)
        .ok_or_else(|| DataError::MissingColumn(CLOSE_COLUMN.to_string()))?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped_rows = 0;

    for row in rows {
        let Some(date) = Table::cell(row, date_col).to_date() else {
            skipped_rows += 1;
            continue;
        };
        records.push(PriceRecord { date, close: Table::cell(row, close_col).to_price() });
    }

    if records.is_empty() {
        return Err(DataError::NoUsableRows { skipped: skipped_rows });
    }

    debug!(rows = records.len(), skipped_rows, "price table parsed");
    Ok(ParsedSeries { series: PriceSeries::new(records), skipped_rows })
}

// =============================================================================
// Internal helpers
// =============================================================================

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
        .or_else(|| DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok()))
}

/// Spreadsheet serial numbers count days from 1899-12-30; the fraction is the
/// time of day.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}
