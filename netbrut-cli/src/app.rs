use anyhow::{Context, Result};
use chrono::TimeDelta;
use netbrut_core::rates::{RateCacheRegistry, RateFetcher};
use netbrut_core::{
    CalculationInput, FiscalYearConfig, RateProvider, YearlyDriver, YearlyResult,
};
use netbrut_data::{
    CachedRateProvider, OfflineFetcher, STATIC_RATE_YEAR, StaticRateProvider, TcmbArchive,
    static_series,
};
use netbrut_db_sqlite::SqliteCacheFactory;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::cli::SourceChoice;
use crate::settings::Settings;

/// Build a [`RateCacheRegistry`] with every backend compiled into this binary.
pub fn build_registry() -> RateCacheRegistry {
    let mut registry = RateCacheRegistry::with_memory();
    registry.register(Box::new(SqliteCacheFactory));
    registry
}

/// Rate provider selected by `settings.source`.
pub async fn build_provider(settings: &Settings) -> Result<Box<dyn RateProvider>> {
    match settings.source {
        SourceChoice::Static => Ok(Box::new(StaticRateProvider::new())),
        SourceChoice::Cache => {
            debug!("opening {} rate cache", settings.cache.backend);
            let cache = build_registry()
                .create(&settings.cache)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open {} cache '{}'",
                        settings.cache.backend, settings.cache.connection_string
                    )
                })?;
            let fetcher: Box<dyn RateFetcher> = match &settings.tcmb_archive {
                Some(root) => Box::new(TcmbArchive::new(root)),
                None => Box::new(OfflineFetcher),
            };
            info!(source = fetcher.source_name(), "rate fetcher ready");
            Ok(Box::new(
                CachedRateProvider::new(cache, fetcher)
                    .with_ttl(TimeDelta::hours(settings.cache_ttl_hours)),
            ))
        }
    }
}

/// Map resolved settings onto the engine input.
pub fn build_input(
    settings: &Settings,
    config: &FiscalYearConfig,
    current_rate: Option<Decimal>,
) -> CalculationInput {
    CalculationInput {
        target_net: settings.net,
        currency: settings.currency,
        start_month: settings.start_month,
        start_year: settings.start_year,
        premium_policy: settings.premium_policy(config),
        include_vat: settings.include_vat,
        manual_rate_override: settings.rate_override,
        current_rate,
    }
}

/// Yearly driver for the 2025 ruleset, with the built-in table as fallback
/// when calculating that year.
pub fn build_driver(year: i32) -> Result<YearlyDriver> {
    let driver = YearlyDriver::new(FiscalYearConfig::turkey_2025())
        .context("Built-in tariff table is inconsistent")?;
    if year == STATIC_RATE_YEAR {
        Ok(driver.with_static_fallback(static_series()))
    } else {
        Ok(driver)
    }
}

/// Fetch the rates for `settings.year` and run the full year.
pub async fn run(settings: &Settings) -> Result<YearlyResult> {
    let provider = build_provider(settings).await?;

    let series = provider
        .monthly_rates(settings.year)
        .await
        .with_context(|| format!("Failed to load exchange rates for {}", settings.year))?;
    info!(year = series.year, months = series.len(), "loaded rate series");

    let current_rate = match settings.current_rate {
        Some(rate) => Some(rate),
        None => match provider.current_rate().await {
            Ok(rate) => Some(rate),
            Err(err) => {
                warn!(error = %err, "no current rate available for fallback");
                None
            }
        },
    };

    let driver = build_driver(settings.year)?;
    let input = build_input(settings, driver.config(), current_rate);
    let result = driver
        .calculate(&input, &series)
        .context("Calculation failed")?;

    if result.totals.any_fallback {
        warn!("one or more months used a substituted exchange rate");
    }
    if result.totals.any_non_convergence {
        warn!("one or more months did not converge");
    }
    Ok(result)
}
