use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::upload::COLUMNS;

pub const MODEL_FILE_NAME: &str = "modelo_debits.csv";
pub const MODEL_MIME: &str = "text/csv; charset=utf-8";

/// Spreadsheet applications need the byte-order mark to open UTF-8 CSV with accents intact.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Model spreadsheet offered for download: the required header row and one
/// filled example row dated `today`.
pub fn model_spreadsheet(today: NaiveDate) -> Result<Vec<u8>> {
    let date = today.format("%Y-%m-%d").to_string();
    let example = [
        "ASBZ SP",
        "JDOE",
        "Opcional",
        "007",
        "001",
        "CORREIOS",
        "150.75",
        date.as_str(),
        "SIM",
        "NÃO",
        "Exemplo de observação para a despesa.",
    ];

    let mut writer = ::csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(COLUMNS)?;
    writer.write_record(example)?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to finish model spreadsheet")
}
