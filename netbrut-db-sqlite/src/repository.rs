use async_trait::async_trait;
use chrono::{DateTime, Month, NaiveDate, Utc};
use netbrut_core::RateCache;
use netbrut_core::RateError;
use netbrut_core::rates::CachedRate;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use crate::decimal::get_decimal;

const MEMORY_URL: &str = "sqlite::memory:";

/// Turn a bare path or `:memory:` into a sqlx connection URL.
///
/// Strings that already start with `sqlite:` are returned unchanged. Bare
/// paths get `mode=rwc` so the file is created on first use.
pub(crate) fn connection_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed.is_empty() || trimmed == ":memory:" {
        MEMORY_URL.to_string()
    } else if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else {
        format!("sqlite:{trimmed}?mode=rwc")
    }
}

/// [`RateCache`] stored in a SQLite `monthly_rates` table.
pub struct SqliteRateCache {
    pool: SqlitePool,
}

impl SqliteRateCache {
    /// Connect to `database_url` (a bare path, `:memory:` or a sqlx URL).
    ///
    /// In-memory databases live as long as their single connection, so the
    /// pool is pinned to one connection that never expires.
    pub async fn new(database_url: &str) -> Result<Self, RateError> {
        let url = connection_url(database_url);
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = options
            .connect(&url)
            .await
            .map_err(|e| RateError::Connection(format!("{url}: {e}")))?;
        debug!(%url, "opened sqlite rate cache");
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RateError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RateError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn month_from_row(row: &SqliteRow) -> Result<Month, RateError> {
    let number: u32 = row
        .try_get("month")
        .map_err(|e| RateError::Storage(e.to_string()))?;
    u8::try_from(number)
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .ok_or_else(|| RateError::Storage(format!("month {number} out of range")))
}

fn rate_from_row(row: &SqliteRow) -> Result<CachedRate, RateError> {
    Ok(CachedRate {
        year: row
            .try_get("year")
            .map_err(|e| RateError::Storage(e.to_string()))?,
        month: month_from_row(row)?,
        rate: get_decimal(row, "rate")?,
        rate_date: row
            .try_get::<NaiveDate, _>("rate_date")
            .map_err(|e| RateError::Storage(format!("Failed to get rate_date: {}", e)))?,
        fetched_at: row
            .try_get::<DateTime<Utc>, _>("fetched_at")
            .map_err(|e| RateError::Storage(format!("Failed to get fetched_at: {}", e)))?,
    })
}

#[async_trait]
impl RateCache for SqliteRateCache {
    async fn get_rate(
        &self,
        year: i32,
        month: Month,
    ) -> Result<CachedRate, RateError> {
        let row = sqlx::query(
            "SELECT year, month, rate, rate_date, fetched_at
             FROM monthly_rates WHERE year = ? AND month = ?",
        )
        .bind(year)
        .bind(month.number_from_month())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RateError::Storage(e.to_string()))?
        .ok_or(RateError::NotFound)?;

        rate_from_row(&row)
    }

    async fn put_rate(
        &self,
        rate: &CachedRate,
    ) -> Result<(), RateError> {
        sqlx::query(
            "INSERT INTO monthly_rates (year, month, rate, rate_date, fetched_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (year, month) DO UPDATE SET
                 rate = excluded.rate,
                 rate_date = excluded.rate_date,
                 fetched_at = excluded.fetched_at",
        )
        .bind(rate.year)
        .bind(rate.month.number_from_month())
        .bind(rate.rate.to_string())
        .bind(rate.rate_date)
        .bind(rate.fetched_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RateError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn list_rates(
        &self,
        year: i32,
    ) -> Result<Vec<CachedRate>, RateError> {
        let rows = sqlx::query(
            "SELECT year, month, rate, rate_date, fetched_at
             FROM monthly_rates WHERE year = ?
             ORDER BY month",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RateError::Storage(e.to_string()))?;

        rows.iter().map(rate_from_row).collect()
    }

    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>, RateError> {
        let row = sqlx::query("SELECT fetched_at FROM monthly_rates ORDER BY fetched_at DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RateError::Storage(e.to_string()))?;

        row.map(|row| {
            row.try_get::<DateTime<Utc>, _>("fetched_at")
                .map_err(|e| RateError::Storage(e.to_string()))
        })
        .transpose()
    }

    async fn clear(&self) -> Result<(), RateError> {
        let deleted = sqlx::query("DELETE FROM monthly_rates")
            .execute(&self.pool)
            .await
            .map_err(|e| RateError::Storage(e.to_string()))?
            .rows_affected();
        debug!(deleted, "cleared sqlite rate cache");
        Ok(())
    }
}
