//! Decimal helpers shared by the tariff, premium and report code.
//!
//! Amounts are printed with comma thousands separators, as in the published
//! tariff tables (`4,300,000`), and rounded half away from zero.

use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Larger of `a` and `b`; used to floor premium bases at zero.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Smaller of `a` and `b`.
pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}

/// Formats `value` with comma thousands separators, rounded half-up to
/// `decimal_places`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use netbrut_core::calculations::common::format_thousands;
///
/// assert_eq!(format_thousands(dec!(4300000), 0), "4,300,000");
/// assert_eq!(format_thousands(dec!(12345.675), 2), "12,345.68");
/// assert_eq!(format_thousands(dec!(-1500.5), 2), "-1,500.50");
/// ```
pub fn format_thousands(
    value: Decimal,
    decimal_places: u32,
) -> String {
    let rounded =
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    let magnitude = rounded.abs();
    let integer = magnitude.trunc().to_i128().unwrap_or_default();

    let mut text = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        text.push('-');
    }
    text.push_str(&integer.to_formatted_string(&Locale::en));

    if decimal_places > 0 {
        let fraction = format!("{:.*}", decimal_places as usize, magnitude.fract());
        // "0.68" -> ".68"
        text.push_str(fraction.trim_start_matches('0'));
    }
    text
}
