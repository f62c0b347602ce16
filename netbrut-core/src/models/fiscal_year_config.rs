use chrono::Month;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::SolverSettings;
use crate::models::TaxBracket;

/// Fixed stamp duties owed per filed return, in TRY.
///
/// These are reported alongside each month but are not part of the
/// net-to-gross equation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampDutySchedule {
    /// VAT return, filed every month.
    pub vat_return_monthly: Decimal,
    /// Provisional income tax return, filed in March, June, September, December.
    pub provisional_tax_quarterly: Decimal,
    /// Withholding return, filed on the same quarterly cycle.
    pub withholding_return_quarterly: Decimal,
    /// Annual income tax return, attributed to December.
    pub annual_return: Decimal,
}

impl StampDutySchedule {
    /// Total stamp duty attributed to a calendar month.
    pub fn for_month(
        &self,
        month: Month,
    ) -> Decimal {
        let number = month.number_from_month();
        let mut total = self.vat_return_monthly;
        if number % 3 == 0 {
            total += self.provisional_tax_quarterly + self.withholding_return_quarterly;
        }
        if month == Month::December {
            total += self.annual_return;
        }
        total
    }
}

/// The ruleset for one fiscal year: tariff, premium, VAT and fee constants.
///
/// Values change only with a new fiscal year; see [`FiscalYearConfig::turkey_2025`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearConfig {
    pub fiscal_year: i32,
    pub brackets: Vec<TaxBracket>,
    /// Monthly ceiling on the social-security premium, in TRY.
    pub premium_cap: Decimal,
    /// Mandatory rate for the first active month of the first operative year.
    pub full_premium_rate: Decimal,
    /// Rate after the five-point treasury discount.
    pub discounted_premium_rate: Decimal,
    pub vat_rate: Decimal,
    /// Monthly accounting fee, billed in EUR.
    pub accounting_fee_eur: Decimal,
    pub stamp_duty: StampDutySchedule,
    pub solver: SolverSettings,
}

impl FiscalYearConfig {
    /// 2025 non-wage income tariff and Bağ-Kur parameters.
    pub fn turkey_2025() -> Self {
        Self {
            fiscal_year: 2025,
            brackets: vec![
                TaxBracket {
                    lower_bound: dec!(0),
                    upper_bound: Some(dec!(158000)),
                    marginal_rate: dec!(0.15),
                    base_tax: dec!(0),
                },
                TaxBracket {
                    lower_bound: dec!(158000),
                    upper_bound: Some(dec!(330000)),
                    marginal_rate: dec!(0.20),
                    base_tax: dec!(23700),
                },
                TaxBracket {
                    lower_bound: dec!(330000),
                    upper_bound: Some(dec!(800000)),
                    marginal_rate: dec!(0.27),
                    base_tax: dec!(58100),
                },
                TaxBracket {
                    lower_bound: dec!(800000),
                    upper_bound: Some(dec!(4300000)),
                    marginal_rate: dec!(0.35),
                    base_tax: dec!(185000),
                },
                TaxBracket {
                    lower_bound: dec!(4300000),
                    upper_bound: None,
                    marginal_rate: dec!(0.40),
                    base_tax: dec!(1410000),
                },
            ],
            premium_cap: dec!(68264.49),
            full_premium_rate: dec!(0.3775),
            discounted_premium_rate: dec!(0.3275),
            vat_rate: dec!(0.20),
            accounting_fee_eur: dec!(45),
            stamp_duty: StampDutySchedule {
                vat_return_monthly: dec!(150),
                provisional_tax_quarterly: dec!(150),
                withholding_return_quarterly: dec!(150),
                annual_return: dec!(150),
            },
            solver: SolverSettings::default(),
        }
    }
}

impl Default for FiscalYearConfig {
    fn default() -> Self {
        Self::turkey_2025()
    }
}
