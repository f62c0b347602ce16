use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Month, Utc};

use super::factory::{CacheConfig, RateCacheFactory};
use super::provider::{CachedRate, RateCache, RateError};

/// Process-local [`RateCache`], keyed by `(year, month number)`.
#[derive(Debug, Default)]
pub struct InMemoryRateCache {
    rates: RwLock<BTreeMap<(i32, u32), CachedRate>>,
}

impl InMemoryRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> RateError {
        RateError::Storage("in-memory rate cache lock poisoned".to_string())
    }
}

#[async_trait]
impl RateCache for InMemoryRateCache {
    async fn get_rate(
        &self,
        year: i32,
        month: Month,
    ) -> Result<CachedRate, RateError> {
        let rates = self.rates.read().map_err(|_| Self::poisoned())?;
        rates
            .get(&(year, month.number_from_month()))
            .cloned()
            .ok_or(RateError::NotFound)
    }

    async fn put_rate(
        &self,
        rate: &CachedRate,
    ) -> Result<(), RateError> {
        let mut rates = self.rates.write().map_err(|_| Self::poisoned())?;
        rates.insert((rate.year, rate.month.number_from_month()), rate.clone());
        Ok(())
    }

    async fn list_rates(
        &self,
        year: i32,
    ) -> Result<Vec<CachedRate>, RateError> {
        let rates = self.rates.read().map_err(|_| Self::poisoned())?;
        Ok(rates
            .range((year, 0)..=(year, 12))
            .map(|(_, rate)| rate.clone())
            .collect())
    }

    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>, RateError> {
        let rates = self.rates.read().map_err(|_| Self::poisoned())?;
        Ok(rates.values().map(|rate| rate.fetched_at).max())
    }

    async fn clear(&self) -> Result<(), RateError> {
        self.rates.write().map_err(|_| Self::poisoned())?.clear();
        Ok(())
    }
}

/// Factory for the `memory` backend. The connection string is ignored.
pub struct InMemoryCacheFactory;

#[async_trait]
impl RateCacheFactory for InMemoryCacheFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &CacheConfig,
    ) -> Result<Box<dyn RateCache>, RateError> {
        Ok(Box::new(InMemoryRateCache::new()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn rate(
        year: i32,
        month: Month,
        hour: u32,
    ) -> CachedRate {
        CachedRate {
            year,
            month,
            rate: dec!(40.5),
            rate_date: NaiveDate::from_ymd_opt(year, month.number_from_month(), 20).unwrap(),
            fetched_at: Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn get_missing_rate_is_not_found() {
        let cache = InMemoryRateCache::new();

        assert_eq!(
            cache.get_rate(2025, Month::March).await,
            Err(RateError::NotFound)
        );
    }

    #[tokio::test]
    async fn put_then_get_returns_entry() {
        let cache = InMemoryRateCache::new();
        let entry = rate(2025, Month::March, 8);

        cache.put_rate(&entry).await.unwrap();

        assert_eq!(cache.get_rate(2025, Month::March).await, Ok(entry));
    }

    #[tokio::test]
    async fn put_replaces_existing_month() {
        let cache = InMemoryRateCache::new();
        cache.put_rate(&rate(2025, Month::March, 8)).await.unwrap();
        let newer = CachedRate {
            rate: dec!(41),
            ..rate(2025, Month::March, 9)
        };

        cache.put_rate(&newer).await.unwrap();

        assert_eq!(cache.list_rates(2025).await.unwrap(), vec![newer]);
    }

    #[tokio::test]
    async fn list_rates_filters_year_and_orders_by_month() {
        let cache = InMemoryRateCache::new();
        cache.put_rate(&rate(2025, Month::May, 1)).await.unwrap();
        cache.put_rate(&rate(2024, Month::June, 1)).await.unwrap();
        cache.put_rate(&rate(2025, Month::January, 1)).await.unwrap();

        let months: Vec<Month> = cache
            .list_rates(2025)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.month)
            .collect();

        assert_eq!(months, vec![Month::January, Month::May]);
    }

    #[tokio::test]
    async fn last_updated_is_latest_fetch() {
        let cache = InMemoryRateCache::new();
        assert_eq!(cache.last_updated().await, Ok(None));

        cache.put_rate(&rate(2025, Month::January, 3)).await.unwrap();
        cache.put_rate(&rate(2025, Month::February, 7)).await.unwrap();

        assert_eq!(
            cache.last_updated().await,
            Ok(Some(Utc.with_ymd_and_hms(2025, 6, 1, 7, 0, 0).unwrap()))
        );
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache = InMemoryRateCache::new();
        cache.put_rate(&rate(2025, Month::January, 3)).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.list_rates(2025).await.unwrap().is_empty());
    }
}
