use chrono::Month;
use netbrut_core::MONTH_LABELS;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
pub enum ParseDecimalError {
    #[error("empty amount")]
    Empty,

    #[error("invalid decimal '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: rust_decimal::Error,
    },
}

/// Error returned when a string names no calendar month.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid month '{0}': expected 1-12 or a month name")]
pub struct ParseMonthError(String);

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`).
/// Empty or whitespace-only input is rejected.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Err(ParseDecimalError::Empty);
    }
    normalized.parse().map_err(|e| {
        tracing::error!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError::Invalid {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses a month given as a number (`3`), an English name (`march`, `Mar`)
/// or a Turkish label (`Mart`).
pub fn parse_month(s: &str) -> Result<Month, ParseMonthError> {
    let trimmed = s.trim();
    if let Ok(number) = trimmed.parse::<u8>() {
        return Month::try_from(number).map_err(|_| ParseMonthError(s.to_string()));
    }

    let lowered = trimmed.to_lowercase();
    if let Some(index) = MONTH_LABELS
        .iter()
        .position(|label| label.to_lowercase() == lowered)
    {
        return u8::try_from(index + 1)
            .ok()
            .and_then(|number| Month::try_from(number).ok())
            .ok_or_else(|| ParseMonthError(s.to_string()));
    }

    trimmed
        .parse::<Month>()
        .map_err(|_| ParseMonthError(s.to_string()))
}

/// Formats an optional rate for display, using "—" when `None`.
pub fn opt_rate_display(rate: Option<Decimal>) -> String {
    rate.map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "—".to_string())
}
