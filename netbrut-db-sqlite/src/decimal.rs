use std::str::FromStr;

use netbrut_core::RateError;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Read a decimal column stored as TEXT, INTEGER or REAL.
///
/// Rates are written as TEXT so they keep their exact digits; the numeric
/// branches accept rows written by hand with the sqlite shell.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RateError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RateError::Storage(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let text: String = row.try_get(column).map_err(|e| {
                RateError::Storage(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            Decimal::from_str(text.trim()).map_err(|e| {
                RateError::Storage(format!(
                    "Column '{}' holds '{}', not a decimal: {}",
                    column, text, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RateError::Storage(format!("Failed to get INTEGER from '{}': {}", column, e))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RateError::Storage(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RateError::Storage(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        _ => Err(RateError::Storage(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}
