use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Fixed enumerations
// ────────────────────────────────────────────────────────────────────────────

pub const OFFICES: &[&str] = &["ASBZ SP", "ZUCCA BSB", "CONSULTING"];
pub const EXPENSE_TYPES: &[&str] = &["MOTOCA", "CARTÓRIO", "CORREIOS", "OUTROS"];

pub const YES_LABEL: &str = "SIM";
pub const NO_LABEL: &str = "NÃO";
pub const YES_NO: &[&str] = &[YES_LABEL, NO_LABEL];

// ────────────────────────────────────────────────────────────────────────────
// Record
// ────────────────────────────────────────────────────────────────────────────

/// One debit-note request, from the form or from one spreadsheet row.
///
/// Categorical fields hold the raw selected label. They are compared against
/// the fixed enumerations only when the template context is built, so an
/// unknown label leaves its marker group unchecked instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitRecord {
    pub office: String,
    pub requester: String,
    #[serde(default)]
    pub cost_center: Option<String>,
    /// Text, never a number: leading zeros are significant.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub case_id: Option<String>,
    pub expense_type: String,
    #[serde(default)]
    pub amount: RawAmount,
    #[serde(default)]
    pub expense_date: Option<NaiveDate>,
    #[serde(deserialize_with = "yes_no_label")]
    pub reimbursable: String,
    #[serde(deserialize_with = "yes_no_label")]
    pub advance_given: String,
    #[serde(default)]
    pub note: String,
}

impl DebitRecord {
    /// Names of required fields that are blank. Only `requester` is checked;
    /// every other field has a defined rendering when empty.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.requester.trim().is_empty() {
            missing.push("requester");
        }
        missing
    }
}

/// An amount as it arrived from upstream, before coercion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
    #[default]
    Missing,
    /// Any other JSON shape (`true`, `{}`, `[]`). Formats as the fallback.
    Other(serde_json::Value),
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Number(value as f64)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

/// Label for a boolean two-way choice.
pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        YES_LABEL
    } else {
        NO_LABEL
    }
}

/// Accepts `true`/`false` or a label string for a yes/no field.
fn yes_no_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChoiceInput {
        Flag(bool),
        Label(String),
    }

    Ok(match ChoiceInput::deserialize(deserializer)? {
        ChoiceInput::Flag(flag) => yes_no(flag).to_string(),
        ChoiceInput::Label(label) => label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debit::currency::{format_amount, FALLBACK_AMOUNT};
    use serde_json::json;

    fn form_json() -> serde_json::Value {
        json!({
            "office": "ASBZ SP",
            "requester": "jdoe",
            "client_id": "007",
            "case_id": "001",
            "expense_type": "CORREIOS",
            "amount": 150.75,
            "expense_date": "2024-05-01",
            "reimbursable": true,
            "advance_given": false,
            "note": "Exemplo de observação."
        })
    }

    #[test]
    fn test_boolean_choices_become_labels() {
        let record: DebitRecord = serde_json::from_value(form_json()).unwrap();
        assert_eq!(record.reimbursable, "SIM");
        assert_eq!(record.advance_given, "NÃO");
    }

    #[test]
    fn test_label_choices_pass_through() {
        let mut value = form_json();
        value["reimbursable"] = json!("NÃO");
        value["advance_given"] = json!("TALVEZ");
        let record: DebitRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.reimbursable, "NÃO");
        assert_eq!(record.advance_given, "TALVEZ");
    }

    #[test]
    fn test_amount_accepts_number_string_and_null() {
        let mut value = form_json();
        let record: DebitRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.amount, RawAmount::Number(150.75));

        value["amount"] = json!(12);
        let record: DebitRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.amount, RawAmount::Number(12.0));

        value["amount"] = json!("1234.5");
        let record: DebitRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.amount, RawAmount::Text("1234.5".to_string()));

        value["amount"] = json!(null);
        let record: DebitRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.amount, RawAmount::Missing);
    }

    #[test]
    fn test_amount_of_any_other_shape_still_deserializes() {
        for amount in [json!(true), json!({}), json!([]), json!([1, 2])] {
            let mut value = form_json();
            value["amount"] = amount.clone();
            let record: DebitRecord = serde_json::from_value(value).unwrap();
            assert_eq!(record.amount, RawAmount::Other(amount));
            assert_eq!(format_amount(&record.amount), FALLBACK_AMOUNT);
        }
    }

    #[test]
    fn test_optional_fields_default_when_absent() {
        let mut value = form_json();
        let obj = value.as_object_mut().unwrap();
        for key in ["client_id", "case_id", "amount", "expense_date", "note"] {
            obj.remove(key);
        }
        let record: DebitRecord = serde_json::from_value(value).unwrap();
        assert!(record.client_id.is_none());
        assert!(record.cost_center.is_none());
        assert!(record.expense_date.is_none());
        assert_eq!(record.amount, RawAmount::Missing);
        assert_eq!(record.note, "");
    }

    #[test]
    fn test_identifiers_are_text_not_numbers() {
        let record: DebitRecord = serde_json::from_value(form_json()).unwrap();
        assert_eq!(record.client_id.as_deref(), Some("007"));
        assert_eq!(record.case_id.as_deref(), Some("001"));
    }

    #[test]
    fn test_blank_requester_is_reported_missing() {
        let mut value = form_json();
        value["requester"] = json!("   ");
        let record: DebitRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.missing_required_fields(), vec!["requester"]);
    }
}
