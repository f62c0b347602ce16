use async_trait::async_trait;
use chrono::{Month, NaiveDate};
use netbrut_core::{MonthlyRate, RateError, RateProvenance, RateProvider, RateSeries, month_label};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Year covered by the built-in table.
pub const STATIC_RATE_YEAR: i32 = 2025;

/// Monthly EUR→TRY selling rates for 2025, January first.
const RATES_2025: [Decimal; 12] = [
    dec!(37.260),
    dec!(38.010),
    dec!(38.850),
    dec!(43.570),
    dec!(44.960),
    dec!(46.680),
    dec!(46.640),
    dec!(47.540),
    dec!(48.820),
    dec!(48.580),
    dec!(49.150),
    dec!(49.620),
];

/// The built-in 2025 table as a rate series.
pub fn static_series() -> RateSeries {
    let mut month = Month::January;
    let mut months = Vec::with_capacity(RATES_2025.len());
    for rate in RATES_2025 {
        months.push(MonthlyRate {
            month,
            label: month_label(month).to_string(),
            rate: Some(rate),
            rate_date: NaiveDate::from_ymd_opt(STATIC_RATE_YEAR, month.number_from_month(), 20),
            is_current: false,
            provenance: RateProvenance::Static,
        });
        month = month.succ();
    }
    RateSeries::new(STATIC_RATE_YEAR, months)
}

/// Offline provider serving the fixed 2025 table.
#[derive(Debug, Default)]
pub struct StaticRateProvider;

impl StaticRateProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn monthly_rates(
        &self,
        year: i32,
    ) -> Result<RateSeries, RateError> {
        if year != STATIC_RATE_YEAR {
            return Err(RateError::Configuration(format!(
                "static rate table covers {STATIC_RATE_YEAR} only, requested {year}"
            )));
        }
        Ok(static_series())
    }

    /// The December rate, the latest in the table.
    async fn current_rate(&self) -> Result<Decimal, RateError> {
        RATES_2025.last().copied().ok_or(RateError::NotFound)
    }
}
