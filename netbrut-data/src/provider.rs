use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, Month, NaiveDate, TimeDelta, Utc};
use netbrut_core::rates::{CachedRate, RateFetcher};
use netbrut_core::{
    MonthlyRate, RateCache, RateError, RateProvenance, RateProvider, RateSeries, month_label,
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::tcmb::{REFERENCE_DAY, reference_date};

/// Age after which the current month's cached rate is fetched again.
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// Rate provider backed by a [`RateCache`] and refreshed from a
/// [`RateFetcher`].
///
/// Past months are served from the cache once stored. The current month is
/// refreshed whenever the cache has not been written within the TTL. A
/// failed fetch falls back to the cached value, or to a record without a
/// rate when nothing was cached.
pub struct CachedRateProvider {
    cache: Box<dyn RateCache>,
    fetcher: Box<dyn RateFetcher>,
    ttl: TimeDelta,
    pinned_now: Option<DateTime<Utc>>,
}

impl CachedRateProvider {
    pub fn new(
        cache: Box<dyn RateCache>,
        fetcher: Box<dyn RateFetcher>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            ttl: TimeDelta::hours(DEFAULT_CACHE_TTL_HOURS),
            pinned_now: None,
        }
    }

    pub fn with_ttl(
        mut self,
        ttl: TimeDelta,
    ) -> Self {
        self.ttl = ttl;
        self
    }

    /// Evaluate "today" and cache age against a fixed instant.
    pub fn at(
        mut self,
        now: DateTime<Utc>,
    ) -> Self {
        self.pinned_now = Some(now);
        self
    }

    pub fn cache(&self) -> &dyn RateCache {
        self.cache.as_ref()
    }

    fn now(&self) -> DateTime<Utc> {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    fn today(&self) -> NaiveDate {
        match self.pinned_now {
            Some(now) => now.date_naive(),
            None => Local::now().date_naive(),
        }
    }

    async fn cached(
        &self,
        year: i32,
        month: Month,
    ) -> Result<Option<CachedRate>, RateError> {
        match self.cache.get_rate(year, month).await {
            Ok(rate) => Ok(Some(rate)),
            Err(RateError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn resolve_month(
        &self,
        year: i32,
        month: Month,
        today: NaiveDate,
        stale: bool,
    ) -> Result<MonthlyRate, RateError> {
        let is_current = today.year() == year && today.month() == month.number_from_month();
        let cached = self.cached(year, month).await?;
        let record = |rate: Option<Decimal>, rate_date: Option<NaiveDate>, provenance| MonthlyRate {
            month,
            label: month_label(month).to_string(),
            rate,
            rate_date,
            is_current,
            provenance,
        };

        if let Some(hit) = &cached
            && !(is_current && stale)
        {
            debug!(year, month = month.name(), "rate served from cache");
            return Ok(record(Some(hit.rate), Some(hit.rate_date), RateProvenance::Cache));
        }

        let date = reference_date(year, month, today)?;
        info!(
            year,
            month = month.name(),
            %date,
            source = self.fetcher.source_name(),
            "fetching rate"
        );
        let fetched = match self.fetcher.fetch(date).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(%date, error = %err, "rate fetch failed");
                None
            }
        };

        match (fetched, cached) {
            (Some(fetched), _) => {
                self.cache
                    .put_rate(&CachedRate {
                        year,
                        month,
                        rate: fetched.rate,
                        rate_date: fetched.date,
                        fetched_at: self.now(),
                    })
                    .await?;
                Ok(record(Some(fetched.rate), Some(fetched.date), RateProvenance::Live))
            }
            (None, Some(hit)) => Ok(record(Some(hit.rate), Some(hit.rate_date), RateProvenance::Cache)),
            (None, None) => {
                warn!(year, month = month.name(), "no rate available");
                let nominal = NaiveDate::from_ymd_opt(year, month.number_from_month(), REFERENCE_DAY);
                Ok(record(None, nominal, RateProvenance::Failed))
            }
        }
    }
}

#[async_trait]
impl RateProvider for CachedRateProvider {
    async fn monthly_rates(
        &self,
        year: i32,
    ) -> Result<RateSeries, RateError> {
        let today = self.today();
        let last_month = match year.cmp(&today.year()) {
            std::cmp::Ordering::Less => 12,
            std::cmp::Ordering::Equal => today.month(),
            std::cmp::Ordering::Greater => {
                return Err(RateError::Configuration(format!(
                    "cannot provide rates for future year {year}"
                )));
            }
        };

        let stale = match self.cache.last_updated().await? {
            Some(updated) => self.now() - updated > self.ttl,
            None => true,
        };

        let mut months = Vec::new();
        let mut month = Month::January;
        for _ in 0..last_month {
            months.push(self.resolve_month(year, month, today, stale).await?);
            month = month.succ();
        }

        Ok(RateSeries::new(year, months))
    }

    /// Today's bulletin, else the latest cached rate of this year.
    async fn current_rate(&self) -> Result<Decimal, RateError> {
        let today = self.today();
        match self.fetcher.fetch(today).await {
            Ok(Some(fetched)) => return Ok(fetched.rate),
            Ok(None) => debug!(%today, "no bulletin for today"),
            Err(err) => warn!(%today, error = %err, "current rate fetch failed"),
        }

        self.cache
            .list_rates(today.year())
            .await?
            .last()
            .map(|latest| latest.rate)
            .ok_or(RateError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::TimeZone;
    use netbrut_core::rates::{FetchedRate, InMemoryRateCache};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    /// Serves fixed rates by date and records every requested date.
    #[derive(Default)]
    struct ScriptedFetcher {
        rates: HashMap<NaiveDate, Decimal>,
        requested: Arc<Mutex<Vec<NaiveDate>>>,
    }

    #[async_trait]
    impl RateFetcher for ScriptedFetcher {
        fn source_name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch(
            &self,
            date: NaiveDate,
        ) -> Result<Option<FetchedRate>, RateError> {
            self.requested.lock().unwrap().push(date);
            Ok(self.rates.get(&date).map(|rate| FetchedRate { date, rate: *rate }))
        }
    }

    struct BrokenFetcher;

    #[async_trait]
    impl RateFetcher for BrokenFetcher {
        fn source_name(&self) -> &'static str {
            "broken"
        }

        async fn fetch(
            &self,
            _date: NaiveDate,
        ) -> Result<Option<FetchedRate>, RateError> {
            Err(RateError::Source("unreachable".to_string()))
        }
    }

    fn date(
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    /// 11 March 2025, a Tuesday.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 11, 12, 0, 0).unwrap()
    }

    fn cached(
        month: Month,
        rate: Decimal,
        fetched_at: DateTime<Utc>,
    ) -> CachedRate {
        CachedRate {
            year: 2025,
            month,
            rate,
            rate_date: date(month.number_from_month(), 20),
            fetched_at,
        }
    }

    fn scripted(rates: &[(NaiveDate, Decimal)]) -> (ScriptedFetcher, Arc<Mutex<Vec<NaiveDate>>>) {
        let fetcher = ScriptedFetcher {
            rates: rates.iter().copied().collect(),
            requested: Arc::default(),
        };
        let requested = fetcher.requested.clone();
        (fetcher, requested)
    }

    #[tokio::test]
    async fn empty_cache_fetches_every_month_up_to_today() {
        let (fetcher, requested) = scripted(&[
            (date(1, 20), dec!(37.26)),
            (date(2, 20), dec!(38.01)),
            (date(3, 11), dec!(38.50)),
        ]);
        let provider =
            CachedRateProvider::new(Box::new(InMemoryRateCache::new()), Box::new(fetcher)).at(now());

        let series = provider.monthly_rates(2025).await.unwrap();

        assert_eq!(series.len(), 3);
        assert!(series.months.iter().all(|m| m.provenance == RateProvenance::Live));
        assert_eq!(series.months[2].rate, Some(dec!(38.50)));
        assert!(series.months[2].is_current);
        assert!(!series.months[0].is_current);
        assert_eq!(*requested.lock().unwrap(), vec![date(1, 20), date(2, 20), date(3, 11)]);
        assert_eq!(
            provider.cache().get_rate(2025, Month::February).await.unwrap().rate,
            dec!(38.01)
        );
    }

    #[tokio::test]
    async fn fresh_cache_is_served_without_fetching() {
        let cache = InMemoryRateCache::new();
        let recent = now() - TimeDelta::hours(2);
        cache.put_rate(&cached(Month::January, dec!(37.26), recent)).await.unwrap();
        cache.put_rate(&cached(Month::February, dec!(38.01), recent)).await.unwrap();
        cache.put_rate(&cached(Month::March, dec!(38.40), recent)).await.unwrap();
        let (fetcher, requested) = scripted(&[]);
        let provider = CachedRateProvider::new(Box::new(cache), Box::new(fetcher)).at(now());

        let series = provider.monthly_rates(2025).await.unwrap();

        assert!(requested.lock().unwrap().is_empty());
        assert!(series.months.iter().all(|m| m.provenance == RateProvenance::Cache));
        assert_eq!(series.months[2].rate, Some(dec!(38.40)));
    }

    #[tokio::test]
    async fn stale_cache_refreshes_current_month_only() {
        let cache = InMemoryRateCache::new();
        let old = now() - TimeDelta::hours(30);
        cache.put_rate(&cached(Month::January, dec!(37.26), old)).await.unwrap();
        cache.put_rate(&cached(Month::February, dec!(38.01), old)).await.unwrap();
        cache.put_rate(&cached(Month::March, dec!(38.20), old)).await.unwrap();
        let (fetcher, requested) = scripted(&[(date(3, 11), dec!(38.55))]);
        let provider = CachedRateProvider::new(Box::new(cache), Box::new(fetcher)).at(now());

        let series = provider.monthly_rates(2025).await.unwrap();

        assert_eq!(*requested.lock().unwrap(), vec![date(3, 11)]);
        assert_eq!(series.months[0].provenance, RateProvenance::Cache);
        assert_eq!(series.months[2].provenance, RateProvenance::Live);
        assert_eq!(series.months[2].rate, Some(dec!(38.55)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_cached_value() {
        let cache = InMemoryRateCache::new();
        let old = now() - TimeDelta::hours(30);
        cache.put_rate(&cached(Month::March, dec!(38.20), old)).await.unwrap();
        let provider = CachedRateProvider::new(Box::new(cache), Box::new(BrokenFetcher)).at(now());

        let series = provider.monthly_rates(2025).await.unwrap();

        assert_eq!(series.months[2].rate, Some(dec!(38.20)));
        assert_eq!(series.months[2].provenance, RateProvenance::Cache);
    }

    #[tokio::test]
    async fn month_without_any_rate_is_failed_record() {
        let (fetcher, _) = scripted(&[(date(1, 20), dec!(37.26))]);
        let provider =
            CachedRateProvider::new(Box::new(InMemoryRateCache::new()), Box::new(fetcher)).at(now());

        let series = provider.monthly_rates(2025).await.unwrap();
        let february = &series.months[1];

        assert_eq!(february.rate, None);
        assert_eq!(february.provenance, RateProvenance::Failed);
        assert_eq!(february.rate_date, Some(date(2, 20)));
        assert_eq!(february.label, "Şubat");
    }

    #[tokio::test]
    async fn past_year_covers_twelve_months() {
        let (fetcher, _) = scripted(&[]);
        let provider =
            CachedRateProvider::new(Box::new(InMemoryRateCache::new()), Box::new(fetcher)).at(now());

        let series = provider.monthly_rates(2024).await.unwrap();

        assert_eq!(series.len(), 12);
        assert!(series.months.iter().all(|m| !m.is_current));
    }

    #[tokio::test]
    async fn future_year_is_configuration_error() {
        let (fetcher, _) = scripted(&[]);
        let provider =
            CachedRateProvider::new(Box::new(InMemoryRateCache::new()), Box::new(fetcher)).at(now());

        assert!(matches!(
            provider.monthly_rates(2026).await,
            Err(RateError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn current_rate_prefers_todays_bulletin() {
        let (fetcher, _) = scripted(&[(date(3, 11), dec!(38.55))]);
        let provider =
            CachedRateProvider::new(Box::new(InMemoryRateCache::new()), Box::new(fetcher)).at(now());

        assert_eq!(provider.current_rate().await, Ok(dec!(38.55)));
    }

    #[tokio::test]
    async fn current_rate_falls_back_to_latest_cached() {
        let cache = InMemoryRateCache::new();
        cache.put_rate(&cached(Month::January, dec!(37.26), now())).await.unwrap();
        cache.put_rate(&cached(Month::February, dec!(38.01), now())).await.unwrap();
        let provider = CachedRateProvider::new(Box::new(cache), Box::new(BrokenFetcher)).at(now());

        assert_eq!(provider.current_rate().await, Ok(dec!(38.01)));
    }

    #[tokio::test]
    async fn current_rate_without_data_is_not_found() {
        let (fetcher, _) = scripted(&[]);
        let provider =
            CachedRateProvider::new(Box::new(InMemoryRateCache::new()), Box::new(fetcher)).at(now());

        assert_eq!(provider.current_rate().await, Err(RateError::NotFound));
    }
}
