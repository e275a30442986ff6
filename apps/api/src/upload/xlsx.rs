use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use tracing::debug;

use crate::upload::{records_from_rows, Cell, RowReader, UploadError, UploadedRow};

/// Reads the first worksheet of an `.xlsx` workbook.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxRowReader;

impl RowReader for XlsxRowReader {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<UploadedRow>, UploadError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
        let range = workbook.worksheet_range_at(0).ok_or(UploadError::Empty)??;
        debug!("Worksheet range {:?}", range.get_size());

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .ok_or(UploadError::Empty)?
            .iter()
            .map(|c| c.to_string())
            .collect();

        records_from_rows(&header, rows.map(|r| r.iter().map(to_cell).collect()))
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Cell::DateTime(value),
            None => Cell::Number(dt.as_f64()),
        },
        other => Cell::text(&other.to_string()),
    }
}
