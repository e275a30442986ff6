use chrono::NaiveDate;

const DOCUMENT_EXTENSION: &str = "docx";

/// `DEBIT_Cliente_<client>_Caso_<case>_<YYYY-MM-DD>.docx` for a single form submission.
pub fn single_document_name(client_id: &str, case_id: &str, generated_on: NaiveDate) -> String {
    document_name(client_id, case_id, &generated_on.format("%Y-%m-%d").to_string())
}

/// Same pattern as [`single_document_name`], suffixed with the 1-based spreadsheet row.
pub fn batch_document_name(client_id: &str, case_id: &str, row: usize) -> String {
    document_name(client_id, case_id, &row.to_string())
}

pub fn batch_archive_name(generated_on: NaiveDate) -> String {
    format!("DEBITS_Gerados_{}.zip", generated_on.format("%Y-%m-%d"))
}

fn document_name(client_id: &str, case_id: &str, suffix: &str) -> String {
    format!(
        "DEBIT_Cliente_{}_Caso_{}_{}.{DOCUMENT_EXTENSION}",
        path_safe(client_id),
        path_safe(case_id),
        suffix
    )
}

/// Identifiers are user text; keep them from introducing path segments.
fn path_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_single_name_uses_date_stamp() {
        assert_eq!(
            single_document_name("007", "001", may_first()),
            "DEBIT_Cliente_007_Caso_001_2024-05-01.docx"
        );
    }

    #[test]
    fn test_batch_name_uses_row_index() {
        assert_eq!(
            batch_document_name("007", "001", 3),
            "DEBIT_Cliente_007_Caso_001_3.docx"
        );
    }

    #[test]
    fn test_empty_identifiers_stay_empty() {
        assert_eq!(batch_document_name("", "", 1), "DEBIT_Cliente__Caso__1.docx");
    }

    #[test]
    fn test_path_separators_are_replaced() {
        assert_eq!(
            batch_document_name("../etc", "a\\b", 2),
            "DEBIT_Cliente_.._etc_Caso_a_b_2.docx"
        );
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(batch_archive_name(may_first()), "DEBITS_Gerados_2024-05-01.zip");
    }
}
