//! Cumulative progressive income tax.
//!
//! Non-wage income is taxed on the year-to-date base: each month's tax is the
//! difference between the tariff applied to the new cumulative base and the
//! tariff applied to the previous one. The tariff itself is a piecewise-linear
//! function described by a list of [`TaxBracket`]s.
//!
//! # 2025 Tariff
//!
//! | # | From (TRY) | To (TRY)  | Rate | Tax at lower bound |
//! |---|------------|-----------|------|--------------------|
//! | 1 | 0          | 158,000   | 15%  | 0                  |
//! | 2 | 158,000    | 330,000   | 20%  | 23,700             |
//! | 3 | 330,000    | 800,000   | 27%  | 58,100             |
//! | 4 | 800,000    | 4,300,000 | 35%  | 185,000            |
//! | 5 | 4,300,000  | -         | 40%  | 1,410,000          |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use netbrut_core::FiscalYearConfig;
//! use netbrut_core::calculations::ProgressiveTariff;
//!
//! let tariff = ProgressiveTariff::from_config(&FiscalYearConfig::turkey_2025()).unwrap();
//!
//! assert_eq!(tariff.bracket_tax(dec!(100000)), dec!(15000));
//! // 23,700 + (200,000 - 158,000) x 20%
//! assert_eq!(tariff.bracket_tax(dec!(200000)), dec!(32100));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::common::format_thousands;
use crate::models::{BracketClass, FiscalYearConfig, TaxBracket};

/// Reasons a bracket table is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TariffError {
    #[error("tariff has no brackets")]
    Empty,

    #[error("first bracket must start at 0, got {0}")]
    NonZeroStart(Decimal),

    #[error("bracket {index} starts at {found}, expected {expected}")]
    Gap {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("bracket {0} is unbounded but is not the last bracket")]
    UnboundedBeforeLast(usize),

    #[error("last bracket must be unbounded")]
    BoundedTopBracket,

    #[error("bracket {index} has marginal rate {rate}, expected a value between 0 and 1")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("bracket {index} has base tax {found}, expected {expected}")]
    InconsistentBaseTax {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },
}

/// A validated progressive tariff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressiveTariff {
    brackets: Vec<TaxBracket>,
}

impl ProgressiveTariff {
    /// Validates `brackets` and builds the tariff.
    ///
    /// # Errors
    ///
    /// Returns [`TariffError`] if:
    /// - the table is empty
    /// - the first bracket does not start at 0
    /// - a bracket does not start where the previous one ends
    /// - an unbounded bracket is not last, or the last one is bounded
    /// - a marginal rate is outside [0, 1]
    /// - a base tax does not equal the tax accumulated by the brackets below it
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use netbrut_core::TaxBracket;
    /// use netbrut_core::calculations::{ProgressiveTariff, TariffError};
    ///
    /// let result = ProgressiveTariff::new(vec![
    ///     TaxBracket {
    ///         lower_bound: dec!(0),
    ///         upper_bound: Some(dec!(1000)),
    ///         marginal_rate: dec!(0.10),
    ///         base_tax: dec!(0),
    ///     },
    ///     TaxBracket {
    ///         lower_bound: dec!(1000),
    ///         upper_bound: None,
    ///         marginal_rate: dec!(0.20),
    ///         base_tax: dec!(50),
    ///     },
    /// ]);
    ///
    /// assert_eq!(
    ///     result,
    ///     Err(TariffError::InconsistentBaseTax {
    ///         index: 1,
    ///         expected: dec!(100),
    ///         found: dec!(50),
    ///     })
    /// );
    /// ```
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, TariffError> {
        let first = brackets.first().ok_or(TariffError::Empty)?;
        if !first.lower_bound.is_zero() {
            return Err(TariffError::NonZeroStart(first.lower_bound));
        }

        let last_index = brackets.len() - 1;
        let mut expected_lower = Decimal::ZERO;
        let mut expected_base_tax = Decimal::ZERO;

        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.lower_bound != expected_lower {
                return Err(TariffError::Gap {
                    index,
                    expected: expected_lower,
                    found: bracket.lower_bound,
                });
            }
            if bracket.marginal_rate < Decimal::ZERO || bracket.marginal_rate > Decimal::ONE {
                return Err(TariffError::InvalidRate {
                    index,
                    rate: bracket.marginal_rate,
                });
            }
            if bracket.base_tax != expected_base_tax {
                return Err(TariffError::InconsistentBaseTax {
                    index,
                    expected: expected_base_tax,
                    found: bracket.base_tax,
                });
            }

            match bracket.upper_bound {
                Some(_) if index == last_index => {
                    return Err(TariffError::BoundedTopBracket);
                }
                Some(upper) => {
                    expected_base_tax += (upper - bracket.lower_bound) * bracket.marginal_rate;
                    expected_lower = upper;
                }
                None if index != last_index => {
                    return Err(TariffError::UnboundedBeforeLast(index));
                }
                None => {}
            }
        }

        Ok(Self { brackets })
    }

    /// Builds the tariff of a fiscal-year ruleset.
    pub fn from_config(config: &FiscalYearConfig) -> Result<Self, TariffError> {
        Self::new(config.brackets.clone())
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Tax owed on a cumulative `base`.
    ///
    /// Returns zero for a non-positive base. Otherwise the first bracket whose
    /// upper bound is at or above `base` is used; the unbounded top bracket
    /// catches everything else. The result is continuous at every boundary
    /// and increases monotonically with `base`.
    pub fn bracket_tax(
        &self,
        base: Decimal,
    ) -> Decimal {
        if base <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let (_, bracket) = self.locate(base);
        bracket.base_tax + (base - bracket.lower_bound) * bracket.marginal_rate
    }

    /// Classifies a cumulative `base` for reporting.
    ///
    /// A non-positive base is reported as the first bracket.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use netbrut_core::FiscalYearConfig;
    /// use netbrut_core::calculations::ProgressiveTariff;
    ///
    /// let tariff = ProgressiveTariff::from_config(&FiscalYearConfig::turkey_2025()).unwrap();
    /// let class = tariff.bracket_of(dec!(500000));
    ///
    /// assert_eq!(class.number(), 3);
    /// assert_eq!(class.marginal_rate_percent, dec!(27));
    /// assert_eq!(class.range_description, "330,001 - 800,000 TRY (58,100 TRY + excess)");
    /// ```
    pub fn bracket_of(
        &self,
        base: Decimal,
    ) -> BracketClass {
        let (index, bracket) = self.locate(base);
        BracketClass {
            index,
            marginal_rate_percent: (bracket.marginal_rate * Decimal::ONE_HUNDRED).normalize(),
            range_description: describe(index, bracket),
        }
    }

    fn locate(
        &self,
        base: Decimal,
    ) -> (usize, &TaxBracket) {
        if base <= Decimal::ZERO {
            return (0, &self.brackets[0]);
        }
        let last = self.brackets.len() - 1;
        self.brackets
            .iter()
            .enumerate()
            .find(|(_, bracket)| bracket.covers(base))
            .unwrap_or((last, &self.brackets[last]))
    }
}

fn describe(
    index: usize,
    bracket: &TaxBracket,
) -> String {
    let base_tax = format_thousands(bracket.base_tax, 0);
    match (index, bracket.upper_bound) {
        (0, Some(upper)) => format!("0 - {} TRY", format_thousands(upper, 0)),
        (_, Some(upper)) => format!(
            "{} - {} TRY ({} TRY + excess)",
            format_thousands(bracket.lower_bound + Decimal::ONE, 0),
            format_thousands(upper, 0),
            base_tax,
        ),
        (_, None) => format!(
            "{}+ TRY ({} TRY + excess)",
            format_thousands(bracket.lower_bound, 0),
            base_tax,
        ),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn tariff() -> ProgressiveTariff {
        ProgressiveTariff::from_config(&FiscalYearConfig::turkey_2025()).unwrap()
    }

    fn bracket(
        lower: Decimal,
        upper: Option<Decimal>,
        rate: Decimal,
        base_tax: Decimal,
    ) -> TaxBracket {
        TaxBracket {
            lower_bound: lower,
            upper_bound: upper,
            marginal_rate: rate,
            base_tax,
        }
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn new_accepts_2025_tariff() {
        assert_eq!(tariff().brackets().len(), 5);
    }

    #[test]
    fn new_rejects_empty_table() {
        assert_eq!(ProgressiveTariff::new(vec![]), Err(TariffError::Empty));
    }

    #[test]
    fn new_rejects_non_zero_start() {
        let result = ProgressiveTariff::new(vec![bracket(dec!(10), None, dec!(0.1), dec!(0))]);

        assert_eq!(result, Err(TariffError::NonZeroStart(dec!(10))));
    }

    #[test]
    fn new_rejects_gap_between_brackets() {
        let result = ProgressiveTariff::new(vec![
            bracket(dec!(0), Some(dec!(1000)), dec!(0.1), dec!(0)),
            bracket(dec!(1200), None, dec!(0.2), dec!(100)),
        ]);

        assert_eq!(
            result,
            Err(TariffError::Gap {
                index: 1,
                expected: dec!(1000),
                found: dec!(1200),
            })
        );
    }

    #[test]
    fn new_rejects_unbounded_middle_bracket() {
        let result = ProgressiveTariff::new(vec![
            bracket(dec!(0), None, dec!(0.1), dec!(0)),
            bracket(dec!(0), None, dec!(0.2), dec!(0)),
        ]);

        assert_eq!(result, Err(TariffError::UnboundedBeforeLast(0)));
    }

    #[test]
    fn new_rejects_bounded_top_bracket() {
        let result = ProgressiveTariff::new(vec![bracket(
            dec!(0),
            Some(dec!(1000)),
            dec!(0.1),
            dec!(0),
        )]);

        assert_eq!(result, Err(TariffError::BoundedTopBracket));
    }

    #[test]
    fn new_rejects_rate_above_one() {
        let result = ProgressiveTariff::new(vec![bracket(dec!(0), None, dec!(1.5), dec!(0))]);

        assert_eq!(
            result,
            Err(TariffError::InvalidRate {
                index: 0,
                rate: dec!(1.5),
            })
        );
    }

    // =========================================================================
    // bracket_tax tests
    // =========================================================================

    #[test]
    fn bracket_tax_is_zero_for_zero_base() {
        assert_eq!(tariff().bracket_tax(dec!(0)), dec!(0));
    }

    #[test]
    fn bracket_tax_is_zero_for_negative_base() {
        assert_eq!(tariff().bracket_tax(dec!(-5000)), dec!(0));
    }

    #[test]
    fn bracket_tax_matches_base_tax_at_each_boundary() {
        let tariff = tariff();

        assert_eq!(tariff.bracket_tax(dec!(158000)), dec!(23700));
        assert_eq!(tariff.bracket_tax(dec!(330000)), dec!(58100));
        assert_eq!(tariff.bracket_tax(dec!(800000)), dec!(185000));
        assert_eq!(tariff.bracket_tax(dec!(4300000)), dec!(1410000));
    }

    #[test]
    fn bracket_tax_is_continuous_at_boundaries() {
        let tariff = tariff();
        let epsilon = dec!(0.000001);

        for boundary in [dec!(158000), dec!(330000), dec!(800000), dec!(4300000)] {
            let below = tariff.bracket_tax(boundary);
            let above = tariff.bracket_tax(boundary + epsilon);
            assert!(above >= below);
            assert!(above - below < dec!(0.000001), "jump at {boundary}");
        }
    }

    #[test]
    fn bracket_tax_is_monotonic() {
        let tariff = tariff();
        let mut previous = Decimal::ZERO;
        let mut base = dec!(1);
        while base < dec!(6000000) {
            let tax = tariff.bracket_tax(base);
            assert!(tax > previous, "not increasing at {base}");
            previous = tax;
            base += dec!(12345.67);
        }
    }

    #[test]
    fn bracket_tax_in_top_bracket() {
        // 1,410,000 + 700,000 x 40%
        assert_eq!(tariff().bracket_tax(dec!(5000000)), dec!(1690000));
    }

    // =========================================================================
    // bracket_of tests
    // =========================================================================

    #[test]
    fn bracket_of_non_positive_base_is_first_bracket() {
        let class = tariff().bracket_of(dec!(-1));

        assert_eq!(class.index, 0);
        assert_eq!(class.number(), 1);
        assert_eq!(class.marginal_rate_percent, dec!(15));
    }

    #[test]
    fn bracket_of_describes_first_bracket_without_base_tax() {
        let class = tariff().bracket_of(dec!(1000));

        assert_eq!(class.range_description, "0 - 158,000 TRY");
    }

    #[test]
    fn bracket_of_describes_middle_bracket() {
        let class = tariff().bracket_of(dec!(200000));

        assert_eq!(class.number(), 2);
        assert_eq!(
            class.range_description,
            "158,001 - 330,000 TRY (23,700 TRY + excess)"
        );
    }

    #[test]
    fn bracket_of_describes_top_bracket() {
        let class = tariff().bracket_of(dec!(9000000));

        assert_eq!(class.index, 4);
        assert_eq!(class.marginal_rate_percent, dec!(40));
        assert_eq!(
            class.range_description,
            "4,300,000+ TRY (1,410,000 TRY + excess)"
        );
    }

    #[test]
    fn bracket_of_boundary_belongs_to_lower_bracket() {
        assert_eq!(tariff().bracket_of(dec!(158000)).number(), 1);
        assert_eq!(tariff().bracket_of(dec!(158000.01)).number(), 2);
    }
}
