use std::io::Read;

use chrono::{Month, NaiveDate, Utc};
use netbrut_core::rates::CachedRate;
use netbrut_core::{RateCache, RateError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Day of the month whose bulletin is used when a record has no date.
const DEFAULT_REFERENCE_DAY: u32 = 20;

/// Errors that can occur when loading monthly rate data.
#[derive(Debug, Error)]
pub enum MonthlyRateLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid month {month} for year {year}; expected 1-12")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Rate for {year}-{month:02} must be positive, got {rate}")]
    InvalidRate { year: i32, month: u32, rate: Decimal },

    #[error("Cache error: {0}")]
    Cache(#[from] RateError),
}

impl From<csv::Error> for MonthlyRateLoaderError {
    fn from(err: csv::Error) -> Self {
        MonthlyRateLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from a monthly rate CSV file.
///
/// - `year`: calendar year (e.g., 2025)
/// - `month`: month number, 1-12
/// - `rate`: EUR→TRY selling rate
/// - `rate_date`: bulletin date (`YYYY-MM-DD`); empty means the 20th
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MonthlyRateRecord {
    pub year: i32,
    pub month: u32,
    pub rate: Decimal,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub rate_date: Option<NaiveDate>,
}

impl MonthlyRateRecord {
    fn calendar_month(&self) -> Result<Month, MonthlyRateLoaderError> {
        u8::try_from(self.month)
            .ok()
            .and_then(|number| Month::try_from(number).ok())
            .ok_or(MonthlyRateLoaderError::InvalidMonth {
                year: self.year,
                month: self.month,
            })
    }

    fn validate(&self) -> Result<(), MonthlyRateLoaderError> {
        self.calendar_month()?;
        if self.rate <= Decimal::ZERO {
            return Err(MonthlyRateLoaderError::InvalidRate {
                year: self.year,
                month: self.month,
                rate: self.rate,
            });
        }
        Ok(())
    }

    fn reference_date(&self) -> Result<NaiveDate, MonthlyRateLoaderError> {
        match self.rate_date {
            Some(date) => Ok(date),
            None => NaiveDate::from_ymd_opt(self.year, self.month, DEFAULT_REFERENCE_DAY).ok_or(
                MonthlyRateLoaderError::InvalidMonth {
                    year: self.year,
                    month: self.month,
                },
            ),
        }
    }
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for monthly EUR→TRY rates from CSV files.
///
/// Records are written through the [`RateCache`] trait, so any registered
/// backend can be seeded. Loading replaces existing entries for the same
/// month, which makes repeated loads idempotent.
pub struct MonthlyRateLoader;

impl MonthlyRateLoader {
    /// Parse and validate monthly rate records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<MonthlyRateRecord>, MonthlyRateLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: MonthlyRateRecord = result?;
            record.validate()?;
            records.push(record);
        }

        Ok(records)
    }

    /// Write `records` into `cache`, returning the number stored.
    pub async fn load<C: RateCache + ?Sized>(
        cache: &C,
        records: &[MonthlyRateRecord],
    ) -> Result<usize, MonthlyRateLoaderError> {
        let fetched_at = Utc::now();
        let mut stored = 0;

        for record in records {
            let rate = CachedRate {
                year: record.year,
                month: record.calendar_month()?,
                rate: record.rate,
                rate_date: record.reference_date()?,
                fetched_at,
            };
            cache.put_rate(&rate).await?;
            debug!(year = rate.year, month = record.month, rate = %rate.rate, "stored rate");
            stored += 1;
        }

        Ok(stored)
    }
}
