use crate::upload::{records_from_rows, Cell, RowReader, UploadError, UploadedRow};

/// Reads a comma-separated, UTF-8 file whose first record is the header.
/// Every cell is text; the record builder decides how each column is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRowReader;

impl RowReader for CsvRowReader {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<UploadedRow>, UploadError> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if header.iter().all(|h| h.trim_start_matches('\u{feff}').is_empty()) {
            return Err(UploadError::Empty);
        }

        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(Cell::text).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;

        records_from_rows(&header, rows)
    }
}
