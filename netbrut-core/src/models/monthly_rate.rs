use chrono::{Month, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a month's exchange rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateProvenance {
    Cache,
    Live,
    Static,
    Failed,
    /// Supplied by the user for the current month.
    Manual,
}

impl RateProvenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Live => "live",
            Self::Static => "static",
            Self::Failed => "failed",
            Self::Manual => "manual",
        }
    }
}

/// EUR→TRY rate record for one calendar month.
///
/// `rate` is `None` when the provider could not obtain a value; the engine
/// substitutes a fallback in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRate {
    pub month: Month,
    pub label: String,
    pub rate: Option<Decimal>,
    pub rate_date: Option<NaiveDate>,
    pub is_current: bool,
    pub provenance: RateProvenance,
}

impl MonthlyRate {
    /// The rate, if present and strictly positive.
    pub fn usable_rate(&self) -> Option<Decimal> {
        self.rate.filter(|rate| *rate > Decimal::ZERO)
    }
}

/// Ordered monthly rates for one year as delivered by a rate provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSeries {
    pub year: i32,
    pub months: Vec<MonthlyRate>,
}

impl RateSeries {
    pub fn new(
        year: i32,
        months: Vec<MonthlyRate>,
    ) -> Self {
        Self { year, months }
    }

    /// Position of the first entry for `month`, if any.
    pub fn position_of(
        &self,
        month: Month,
    ) -> Option<usize> {
        self.months.iter().position(|m| m.month == month)
    }

    pub fn get(
        &self,
        month: Month,
    ) -> Option<&MonthlyRate> {
        self.months.iter().find(|m| m.month == month)
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }
}

/// Turkish month names as published alongside TCMB bulletins.
pub const MONTH_LABELS: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

/// Label for `month` from [`MONTH_LABELS`].
pub fn month_label(month: Month) -> &'static str {
    MONTH_LABELS[month.number_from_month() as usize - 1]
}
