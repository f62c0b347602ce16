//! Capped social-security (Bağ-Kur) premium.

use rust_decimal::Decimal;

use crate::calculations::common::{max, min};
use crate::models::FiscalYearConfig;

/// Computes the monthly premium as a share of net income, limited to a cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremiumSchedule {
    cap: Decimal,
}

impl PremiumSchedule {
    pub fn new(cap: Decimal) -> Self {
        Self { cap }
    }

    pub fn from_config(config: &FiscalYearConfig) -> Self {
        Self::new(config.premium_cap)
    }

    pub fn cap(&self) -> Decimal {
        self.cap
    }

    /// `min(max(base, 0) × rate, cap)`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use netbrut_core::calculations::PremiumSchedule;
    ///
    /// let schedule = PremiumSchedule::new(dec!(68264.49));
    ///
    /// assert_eq!(schedule.premium(dec!(100000), dec!(0.3275)), dec!(32750));
    /// assert_eq!(schedule.premium(dec!(500000), dec!(0.3275)), dec!(68264.49));
    /// ```
    pub fn premium(
        &self,
        base: Decimal,
        rate: Decimal,
    ) -> Decimal {
        min(max(base, Decimal::ZERO) * rate, self.cap)
    }
}
