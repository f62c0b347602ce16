use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Currency, FiscalYearConfig};

/// How the social-security premium rate is chosen per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PremiumPolicy {
    /// The same rate for every month.
    Flat(Decimal),
    /// `full` for the first active month of the first operative year,
    /// `discounted` for every other month.
    FirstMonthFull { full: Decimal, discounted: Decimal },
}

impl PremiumPolicy {
    pub fn full(config: &FiscalYearConfig) -> Self {
        Self::Flat(config.full_premium_rate)
    }

    pub fn discounted(config: &FiscalYearConfig) -> Self {
        Self::Flat(config.discounted_premium_rate)
    }

    pub fn first_month_full(config: &FiscalYearConfig) -> Self {
        Self::FirstMonthFull {
            full: config.full_premium_rate,
            discounted: config.discounted_premium_rate,
        }
    }

    /// Premium rate for a month; `first_active_month` is true only for the
    /// very first month a contractor is active in their first year.
    pub fn rate_for(
        &self,
        first_active_month: bool,
    ) -> Decimal {
        match *self {
            Self::Flat(rate) => rate,
            Self::FirstMonthFull { full, discounted } => {
                if first_active_month {
                    full
                } else {
                    discounted
                }
            }
        }
    }
}

/// Everything the yearly driver needs besides the rate series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Desired monthly take-home amount in `currency`.
    pub target_net: Decimal,
    pub currency: Currency,
    /// Month the contractor started invoicing.
    pub start_month: Month,
    pub start_year: i32,
    pub premium_policy: PremiumPolicy,
    pub include_vat: bool,
    /// Replaces the fetched rate of the current month only.
    pub manual_rate_override: Option<Decimal>,
    /// Live reference rate, first choice when a month's rate is unusable.
    pub current_rate: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn flat_policy_ignores_first_month() {
        let policy = PremiumPolicy::Flat(dec!(0.3275));

        assert_eq!(policy.rate_for(true), dec!(0.3275));
        assert_eq!(policy.rate_for(false), dec!(0.3275));
    }

    #[test]
    fn first_month_full_policy_switches_after_first_month() {
        let policy = PremiumPolicy::first_month_full(&FiscalYearConfig::turkey_2025());

        assert_eq!(policy.rate_for(true), dec!(0.3775));
        assert_eq!(policy.rate_for(false), dec!(0.3275));
    }
}
