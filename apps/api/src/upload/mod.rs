// Spreadsheet upload: turns an uploaded workbook into debit records.
// Structural problems (unknown format, missing columns, bad cells) fail the
// whole upload; per-row rendering problems are handled by the batch loop.

pub mod csv;
pub mod model;
pub mod xlsx;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::debit::models::{DebitRecord, RawAmount};

pub use self::csv::CsvRowReader;
pub use self::xlsx::XlsxRowReader;

// ────────────────────────────────────────────────────────────────────────────
// Column layout
// ────────────────────────────────────────────────────────────────────────────

pub const COL_OFFICE: &str = "Escritorio";
pub const COL_REQUESTER: &str = "Solicitante";
pub const COL_COST_CENTER: &str = "CentroCusto";
pub const COL_CLIENT: &str = "Cliente";
pub const COL_CASE: &str = "OS_Caso";
pub const COL_EXPENSE_TYPE: &str = "TipoDespesa";
pub const COL_TOTAL: &str = "Total";
pub const COL_DATE: &str = "DataDespesa";
pub const COL_REIMBURSABLE: &str = "Reembolsavel";
pub const COL_ADVANCE: &str = "Adiantamento";
pub const COL_NOTE: &str = "Observacao";

/// Required header names, in model-spreadsheet order.
pub const COLUMNS: [&str; 11] = [
    COL_OFFICE,
    COL_REQUESTER,
    COL_COST_CENTER,
    COL_CLIENT,
    COL_CASE,
    COL_EXPENSE_TYPE,
    COL_TOTAL,
    COL_DATE,
    COL_REIMBURSABLE,
    COL_ADVANCE,
    COL_NOTE,
];

static EMPTY_CELL: Cell = Cell::Empty;

const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const TEXT_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file '{0}', expected .xlsx or .csv")]
    UnsupportedFormat(String),

    #[error("could not read workbook: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("could not read CSV: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("the spreadsheet has no header row")]
    Empty,

    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}, column {column}: {reason} ('{value}')")]
    InvalidCell {
        row: usize,
        column: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// One data row of the upload. `row` is 1-based and counts every data row
/// below the header, including skipped blank ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedRow {
    pub row: usize,
    pub record: DebitRecord,
}

/// Reads the rows of one uploaded spreadsheet format.
pub trait RowReader: Send + Sync {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<UploadedRow>, UploadError>;
}

/// Picks the reader from the upload's file name extension.
pub fn reader_for(file_name: &str) -> Result<Box<dyn RowReader>, UploadError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" => Ok(Box::new(XlsxRowReader)),
        "csv" => Ok(Box::new(CsvRowReader)),
        _ => Err(UploadError::UnsupportedFormat(file_name.to_string())),
    }
}

/// A cell normalised across spreadsheet formats.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for identifier columns. Integral numbers drop the
    /// decimal part, so `7.0` reads as `"7"` (leading zeros are only kept when
    /// the cell was stored as text).
    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row → record
// ────────────────────────────────────────────────────────────────────────────

/// Header positions of the required columns.
#[derive(Debug)]
struct ColumnIndex([usize; COLUMNS.len()]);

impl ColumnIndex {
    fn from_header(header: &[String]) -> Result<Self, UploadError> {
        let mut positions = [0usize; COLUMNS.len()];
        let mut missing = Vec::new();
        for (slot, name) in COLUMNS.iter().enumerate() {
            match header.iter().position(|h| h.trim_start_matches('\u{feff}') == *name) {
                Some(pos) => positions[slot] = pos,
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(ColumnIndex(positions))
        } else {
            Err(UploadError::MissingColumns(missing))
        }
    }

    fn cell<'a>(&self, cells: &'a [Cell], column: &str) -> &'a Cell {
        COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|slot| cells.get(self.0[slot]))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Converts a header plus data rows into records, skipping blank rows.
pub fn records_from_rows<I>(header: &[String], rows: I) -> Result<Vec<UploadedRow>, UploadError>
where
    I: IntoIterator<Item = Vec<Cell>>,
{
    let columns = ColumnIndex::from_header(header)?;
    let mut uploaded = Vec::new();

    for (i, cells) in rows.into_iter().enumerate() {
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        let row = i + 1;
        let text = |column: &str| columns.cell(&cells, column).as_text();

        let record = DebitRecord {
            office: text(COL_OFFICE).unwrap_or_default(),
            requester: text(COL_REQUESTER).unwrap_or_default(),
            cost_center: text(COL_COST_CENTER),
            client_id: text(COL_CLIENT),
            case_id: text(COL_CASE),
            expense_type: text(COL_EXPENSE_TYPE).unwrap_or_default(),
            amount: raw_amount(columns.cell(&cells, COL_TOTAL)),
            expense_date: expense_date(columns.cell(&cells, COL_DATE), row)?,
            reimbursable: text(COL_REIMBURSABLE).unwrap_or_default(),
            advance_given: text(COL_ADVANCE).unwrap_or_default(),
            note: text(COL_NOTE).unwrap_or_default(),
        };
        uploaded.push(UploadedRow { row, record });
    }

    Ok(uploaded)
}

fn raw_amount(cell: &Cell) -> RawAmount {
    match cell {
        Cell::Empty => RawAmount::Missing,
        Cell::Number(n) => RawAmount::Number(*n),
        Cell::Bool(b) => RawAmount::Number(if *b { 1.0 } else { 0.0 }),
        Cell::Text(s) => RawAmount::Text(s.clone()),
        Cell::DateTime(_) => RawAmount::Text(cell.as_text().unwrap_or_default()),
    }
}

fn expense_date(cell: &Cell, row: usize) -> Result<Option<NaiveDate>, UploadError> {
    let invalid = |value: String| UploadError::InvalidCell {
        row,
        column: COL_DATE,
        value,
        reason: "not a date",
    };

    match cell {
        Cell::Empty => Ok(None),
        Cell::DateTime(dt) => Ok(Some(dt.date())),
        Cell::Text(s) if s.trim().is_empty() => Ok(None),
        Cell::Text(s) => parse_text_date(s.trim())
            .map(Some)
            .ok_or_else(|| invalid(s.clone())),
        other => Err(invalid(other.as_text().unwrap_or_default())),
    }
}

fn parse_text_date(s: &str) -> Option<NaiveDate> {
    TEXT_DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            TEXT_DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}
