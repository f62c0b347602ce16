//! TCMB daily bulletin archive.
//!
//! The central bank publishes one XML bulletin per business day at
//! `kurlar/YYYYMM/DDMMYYYY.xml`. [`TcmbArchive`] reads the same layout from a
//! local directory and extracts the EUR `ForexSelling` value.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{Datelike, Month, NaiveDate, Weekday};
use netbrut_core::RateError;
use netbrut_core::rates::{FetchedRate, RateFetcher};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Day of the month whose bulletin represents the month.
pub const REFERENCE_DAY: u32 = 20;

static EUR_SELLING: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// Extracts the EUR selling rate from a bulletin.
///
/// `Ok(None)` when the bulletin has no EUR entry.
pub fn parse_eur_selling(xml: &str) -> Result<Option<Decimal>, RateError> {
    let pattern = EUR_SELLING
        .get_or_init(|| {
            Regex::new(
                r#"(?s)<Currency[^>]*CurrencyCode="EUR"[^>]*>.*?<ForexSelling>([\d.]+)</ForexSelling>"#,
            )
        })
        .as_ref()
        .map_err(|e| RateError::Source(format!("invalid bulletin pattern: {e}")))?;

    Ok(pattern
        .captures(xml)
        .and_then(|captures| captures.get(1))
        .and_then(|value| value.as_str().parse().ok()))
}

/// Bulletin date that represents `month` of `year`, seen from `today`.
///
/// Past months use the 20th. The current month uses the 20th once it has
/// been reached and `today` before that. A Saturday moves back to Friday
/// (-1 day) and a Sunday to Friday (-2 days).
pub fn reference_date(
    year: i32,
    month: Month,
    today: NaiveDate,
) -> Result<NaiveDate, RateError> {
    let number = month.number_from_month();
    let is_current = today.year() == year && today.month() == number;
    let date = if is_current && today.day() < REFERENCE_DAY {
        today
    } else {
        NaiveDate::from_ymd_opt(year, number, REFERENCE_DAY).ok_or_else(|| {
            RateError::Configuration(format!("no calendar date for {year}-{number:02}"))
        })?
    };

    let step_back = match date.weekday() {
        Weekday::Sat => 1,
        Weekday::Sun => 2,
        _ => 0,
    };
    Ok(date - chrono::Days::new(step_back))
}

/// Reads bulletins from a local mirror of the TCMB archive.
#[derive(Debug, Clone)]
pub struct TcmbArchive {
    root: PathBuf,
}

impl TcmbArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/YYYYMM/DDMMYYYY.xml`
    pub fn bulletin_path(
        &self,
        date: NaiveDate,
    ) -> PathBuf {
        self.root
            .join(date.format("%Y%m").to_string())
            .join(format!("{}.xml", date.format("%d%m%Y")))
    }
}

#[async_trait]
impl RateFetcher for TcmbArchive {
    fn source_name(&self) -> &'static str {
        "tcmb"
    }

    async fn fetch(
        &self,
        date: NaiveDate,
    ) -> Result<Option<FetchedRate>, RateError> {
        let path = self.bulletin_path(date);
        let xml = match tokio::fs::read_to_string(&path).await {
            Ok(xml) => xml,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no bulletin for date");
                return Ok(None);
            }
            Err(err) => {
                return Err(RateError::Source(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };

        match parse_eur_selling(&xml)? {
            Some(rate) => {
                debug!(%date, %rate, "read EUR selling rate");
                Ok(Some(FetchedRate { date, rate }))
            }
            None => {
                warn!(path = %path.display(), "EUR selling rate not found in bulletin");
                Ok(None)
            }
        }
    }
}

/// Fetcher for running without any rate source; every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

#[async_trait]
impl RateFetcher for OfflineFetcher {
    fn source_name(&self) -> &'static str {
        "offline"
    }

    async fn fetch(
        &self,
        _date: NaiveDate,
    ) -> Result<Option<FetchedRate>, RateError> {
        Ok(None)
    }
}
