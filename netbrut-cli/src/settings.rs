//! Run settings: an optional TOML file overlaid by command-line flags.
//!
//! ```toml
//! net = 5000
//! currency = "EUR"
//! start_month = 3          # or "Mart", "march"
//! premium = "first-month"
//! vat = true
//!
//! [rates]
//! source = "cache"
//! cache_backend = "sqlite"
//! cache = "rates.db"
//! tcmb_archive = "/srv/tcmb/kurlar"
//! ttl_hours = 24
//!
//! [logging]
//! level = "debug"
//! file = "netbrut.log"
//! ```

use std::path::{Path, PathBuf};

use chrono::{Datelike, Month, NaiveDate};
use netbrut_core::rates::CacheConfig;
use netbrut_core::{Currency, FiscalYearConfig, PremiumPolicy};
use netbrut_data::{DEFAULT_CACHE_TTL_HOURS, STATIC_RATE_YEAR};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::cli::{Cli, PremiumChoice, SourceChoice};
use crate::utils::{ParseMonthError, parse_month};

const DEFAULT_CACHE_BACKEND: &str = "sqlite";
const DEFAULT_CACHE_PATH: &str = "rates.db";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no net amount given; pass --net or set `net` in the settings file")]
    MissingNet,

    #[error(transparent)]
    Month(#[from] ParseMonthError),
}

/// A month in TOML, either `3` or `"Mart"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MonthValue {
    Number(u8),
    Name(String),
}

impl MonthValue {
    fn to_month(&self) -> Result<Month, ParseMonthError> {
        match self {
            Self::Number(number) => parse_month(&number.to_string()),
            Self::Name(name) => parse_month(name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateSection {
    pub source: Option<SourceChoice>,
    pub cache_backend: Option<String>,
    pub cache: Option<String>,
    pub tcmb_archive: Option<PathBuf>,
    pub ttl_hours: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// Contents of a settings file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub net: Option<Decimal>,
    pub currency: Option<Currency>,
    pub start_month: Option<MonthValue>,
    pub start_year: Option<i32>,
    pub year: Option<i32>,
    pub premium: Option<PremiumChoice>,
    pub premium_rate: Option<Decimal>,
    pub vat: Option<bool>,
    pub rate_override: Option<Decimal>,
    pub current_rate: Option<Decimal>,
    pub display_currency: Option<Currency>,
    pub rates: RateSection,
    pub logging: LoggingSection,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub net: Decimal,
    pub currency: Currency,
    pub start_month: Month,
    pub start_year: i32,
    pub year: i32,
    pub premium: PremiumChoice,
    pub premium_rate: Option<Decimal>,
    pub include_vat: bool,
    pub rate_override: Option<Decimal>,
    pub current_rate: Option<Decimal>,
    pub source: SourceChoice,
    pub cache: CacheConfig,
    pub cache_ttl_hours: i64,
    pub tcmb_archive: Option<PathBuf>,
    pub display_currency: Currency,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Overlay `cli` on `file`. Defaults that depend on the date use `today`.
    ///
    /// The year defaults to the built-in table's year for the static source
    /// and to the current year otherwise; the start year defaults to the
    /// calculated year.
    pub fn resolve(
        cli: &Cli,
        file: FileSettings,
        today: NaiveDate,
    ) -> Result<Self, SettingsError> {
        let net = cli.net.or(file.net).ok_or(SettingsError::MissingNet)?;
        let source = cli.source.or(file.rates.source).unwrap_or_default();
        let year = cli.year.or(file.year).unwrap_or(match source {
            SourceChoice::Static => STATIC_RATE_YEAR,
            SourceChoice::Cache => today.year(),
        });
        let start_month = match (cli.start_month, &file.start_month) {
            (Some(month), _) => month,
            (None, Some(value)) => value.to_month()?,
            (None, None) => Month::January,
        };

        Ok(Self {
            net,
            currency: cli.currency.or(file.currency).unwrap_or_default(),
            start_month,
            start_year: cli.start_year.or(file.start_year).unwrap_or(year),
            year,
            premium: cli.premium.or(file.premium).unwrap_or_default(),
            premium_rate: cli.premium_rate.or(file.premium_rate),
            include_vat: cli.vat || file.vat.unwrap_or(false),
            rate_override: cli.rate_override.or(file.rate_override),
            current_rate: cli.current_rate.or(file.current_rate),
            source,
            cache: CacheConfig {
                backend: cli
                    .cache_backend
                    .clone()
                    .or(file.rates.cache_backend)
                    .unwrap_or_else(|| DEFAULT_CACHE_BACKEND.to_string()),
                connection_string: cli
                    .cache
                    .clone()
                    .or(file.rates.cache)
                    .unwrap_or_else(|| DEFAULT_CACHE_PATH.to_string()),
            },
            cache_ttl_hours: file.rates.ttl_hours.unwrap_or(DEFAULT_CACHE_TTL_HOURS),
            tcmb_archive: cli.tcmb_archive.clone().or(file.rates.tcmb_archive),
            display_currency: cli.display_currency.or(file.display_currency).unwrap_or(Currency::Try),
            log_level: cli.log_level.clone().or(file.logging.level),
            log_file: cli.log_file.clone().or(file.logging.file),
        })
    }

    /// Premium policy for `config`; an explicit rate wins over the choice.
    pub fn premium_policy(
        &self,
        config: &FiscalYearConfig,
    ) -> PremiumPolicy {
        if let Some(rate) = self.premium_rate {
            return PremiumPolicy::Flat(rate);
        }
        match self.premium {
            PremiumChoice::Full => PremiumPolicy::full(config),
            PremiumChoice::Discounted => PremiumPolicy::discounted(config),
            PremiumChoice::FirstMonth => PremiumPolicy::first_month_full(config),
        }
    }
}
