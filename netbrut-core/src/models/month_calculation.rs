use std::ops::AddAssign;

use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{BracketClass, Currency, RateProvenance};

/// Monetary fields of one month, all in the same currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthAmounts {
    /// Net actually delivered after tax, premium and fee.
    pub net: Decimal,
    pub premium: Decimal,
    pub income_tax: Decimal,
    pub accounting_fee: Decimal,
    pub invoice_excl_vat: Decimal,
    pub vat: Decimal,
    pub invoice_incl_vat: Decimal,
    /// Reported only; not deducted from net.
    pub declaration_stamp: Decimal,
}

impl MonthAmounts {
    /// Divides every field by `rate`, turning TRY amounts into EUR.
    pub fn divided_by(
        &self,
        rate: Decimal,
    ) -> Self {
        Self {
            net: self.net / rate,
            premium: self.premium / rate,
            income_tax: self.income_tax / rate,
            accounting_fee: self.accounting_fee / rate,
            invoice_excl_vat: self.invoice_excl_vat / rate,
            vat: self.vat / rate,
            invoice_incl_vat: self.invoice_incl_vat / rate,
            declaration_stamp: self.declaration_stamp / rate,
        }
    }
}

impl AddAssign<&MonthAmounts> for MonthAmounts {
    fn add_assign(
        &mut self,
        other: &MonthAmounts,
    ) {
        self.net += other.net;
        self.premium += other.premium;
        self.income_tax += other.income_tax;
        self.accounting_fee += other.accounting_fee;
        self.invoice_excl_vat += other.invoice_excl_vat;
        self.vat += other.vat;
        self.invoice_incl_vat += other.invoice_incl_vat;
        self.declaration_stamp += other.declaration_stamp;
    }
}

/// Outcome of the root search for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Converged,
    /// No sign change inside the expansion limit; the worst-case invoice was used.
    Unbracketed,
}

/// A recoverable anomaly attached to a month instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthNotice {
    RateFallback {
        original: Option<Decimal>,
        substituted: Decimal,
    },
    NonConvergence {
        worst_case: Decimal,
    },
}

/// Result of solving one month. Amounts are in TRY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCalculation {
    pub month: Month,
    pub label: String,
    /// EUR→TRY rate the month was computed with.
    pub rate: Decimal,
    pub rate_provenance: RateProvenance,
    pub premium_rate: Decimal,
    pub amounts: MonthAmounts,
    /// This month's contribution to the cumulative base.
    pub taxable_base: Decimal,
    pub cumulative_taxable_base: Decimal,
    pub cumulative_tax: Decimal,
    /// Classification of the cumulative base after this month.
    pub bracket: BracketClass,
    pub status: SolveStatus,
    pub notices: Vec<MonthNotice>,
}

impl MonthCalculation {
    pub fn amounts_in(
        &self,
        currency: Currency,
    ) -> MonthAmounts {
        match currency {
            Currency::Try => self.amounts.clone(),
            Currency::Eur => self.amounts.divided_by(self.rate),
        }
    }

    pub fn used_rate_fallback(&self) -> bool {
        self.notices
            .iter()
            .any(|n| matches!(n, MonthNotice::RateFallback { .. }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn amounts() -> MonthAmounts {
        MonthAmounts {
            net: dec!(200),
            premium: dec!(40),
            income_tax: dec!(20),
            accounting_fee: dec!(10),
            invoice_excl_vat: dec!(270),
            vat: dec!(54),
            invoice_incl_vat: dec!(324),
            declaration_stamp: dec!(4),
        }
    }

    #[test]
    fn divided_by_scales_every_field() {
        let eur = amounts().divided_by(dec!(2));

        assert_eq!(eur.net, dec!(100));
        assert_eq!(eur.invoice_incl_vat, dec!(162));
        assert_eq!(eur.declaration_stamp, dec!(2));
    }

    #[test]
    fn add_assign_sums_every_field() {
        let mut total = MonthAmounts::default();
        total += &amounts();
        total += &amounts();

        assert_eq!(total.net, dec!(400));
        assert_eq!(total.vat, dec!(108));
        assert_eq!(total.accounting_fee, dec!(20));
    }
}
