//! Currency display in the Brazilian format: `.` groups thousands, `,` separates
//! the two decimal places (`1234.5` → `1.234,50`).
//!
//! Formatting never fails a record. Anything that cannot be read as a finite
//! number renders as [`FALLBACK_AMOUNT`].

use num_format::{CustomFormat, Grouping, ToFormattedString};
use tracing::debug;

use crate::debit::models::RawAmount;

pub const FALLBACK_AMOUNT: &str = "0,00";

/// Formats an amount for display, falling back to `"0,00"` when the value
/// is missing, non-numeric or not finite.
pub fn format_amount(raw: &RawAmount) -> String {
    match coerce(raw).and_then(format_finite) {
        Some(formatted) => formatted,
        None => {
            debug!("Amount {raw:?} is not numeric, using {FALLBACK_AMOUNT}");
            FALLBACK_AMOUNT.to_string()
        }
    }
}

fn coerce(raw: &RawAmount) -> Option<f64> {
    let value = match raw {
        RawAmount::Number(v) => *v,
        RawAmount::Text(s) => parse_number(s)?,
        RawAmount::Missing | RawAmount::Other(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Parses a decimal string, allowing surrounding whitespace and `_` between digits.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let bytes = s.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'_' {
            let digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let digit_after = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if !(digit_before && digit_after) {
                return None;
            }
        }
    }
    s.replace('_', "").parse::<f64>().ok()
}

/// Rounds half-up to cents on the shortest decimal representation of `value`,
/// so `1.005` becomes `1,01` rather than following the binary approximation.
fn format_finite(value: f64) -> Option<String> {
    // `Display` for f64 never switches to exponent notation.
    let repr = value.abs().to_string();
    let (int_digits, frac_digits) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let frac: Vec<u128> = frac_digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(u128::from)
        .chain(std::iter::repeat(0))
        .take(3)
        .collect();

    let mut cents = int_digits
        .parse::<u128>()
        .ok()?
        .checked_mul(100)?
        .checked_add(frac[0] * 10 + frac[1])?;
    if frac[2] >= 5 {
        cents = cents.checked_add(1)?;
    }

    let format = CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator(".")
        .build()
        .ok()?;
    let whole = (cents / 100).to_formatted_string(&format);
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };

    Some(format!("{sign}{whole},{:02}", cents % 100))
}
