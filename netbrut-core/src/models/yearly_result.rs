use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{BracketClass, Currency, MonthAmounts, MonthCalculation};

/// Year-to-date sums over every computed month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyTotals {
    pub months: usize,
    pub totals_try: MonthAmounts,
    /// Each month converted at its own rate, then summed.
    pub totals_eur: MonthAmounts,
    /// Ending cumulative taxable base (TRY).
    pub taxable_base: Decimal,
    /// Ending cumulative tax (TRY).
    pub income_tax: Decimal,
    pub final_bracket: BracketClass,
    pub any_fallback: bool,
    pub any_non_convergence: bool,
}

impl YearlyTotals {
    pub fn totals_in(
        &self,
        currency: Currency,
    ) -> &MonthAmounts {
        match currency {
            Currency::Try => &self.totals_try,
            Currency::Eur => &self.totals_eur,
        }
    }

    /// Per-month average of the totals in `currency`.
    pub fn monthly_average(
        &self,
        currency: Currency,
    ) -> MonthAmounts {
        let count = Decimal::from(self.months.max(1));
        self.totals_in(currency).divided_by(count)
    }
}

/// Full output of one yearly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyResult {
    pub year: i32,
    /// Currency the target net was expressed in.
    pub currency: Currency,
    pub months: Vec<MonthCalculation>,
    pub totals: YearlyTotals,
}
