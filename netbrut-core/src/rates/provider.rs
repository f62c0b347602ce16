use async_trait::async_trait;
use chrono::{DateTime, Month, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RateSeries;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    #[error("Rate not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Rate source error: {0}")]
    Source(String),
}

/// A rate as persisted in a [`RateCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRate {
    pub year: i32,
    pub month: Month,
    pub rate: Decimal,
    /// Bulletin date the rate was read from.
    pub rate_date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
}

/// A rate returned by a [`RateFetcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedRate {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// Supplies EUR→TRY rates to the engine.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// One record per month from January through the present month of
    /// `year` (all twelve for a past year).
    async fn monthly_rates(&self, year: i32) -> Result<RateSeries, RateError>;

    /// Today's reference rate.
    async fn current_rate(&self) -> Result<Decimal, RateError>;
}

/// Persistent store of monthly rates.
#[async_trait]
pub trait RateCache: Send + Sync {
    async fn get_rate(&self, year: i32, month: Month) -> Result<CachedRate, RateError>;
    /// Inserts or replaces the entry for `rate.year` / `rate.month`.
    async fn put_rate(&self, rate: &CachedRate) -> Result<(), RateError>;
    /// Entries of `year`, ordered by month.
    async fn list_rates(&self, year: i32) -> Result<Vec<CachedRate>, RateError>;
    /// Most recent `fetched_at` across all entries.
    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>, RateError>;
    async fn clear(&self) -> Result<(), RateError>;
}

/// Reads the rate published for a single bulletin date.
///
/// `Ok(None)` means the source has no bulletin for that date.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch(&self, date: NaiveDate) -> Result<Option<FetchedRate>, RateError>;
}
