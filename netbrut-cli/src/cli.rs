use std::path::PathBuf;

use chrono::Month;
use clap::{Parser, ValueEnum};
use netbrut_core::Currency;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::utils::{parse_decimal, parse_month};

/// Social-security premium rate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PremiumChoice {
    /// Full rate in every month.
    #[default]
    Full,
    /// Discounted rate in every month.
    Discounted,
    /// Full rate in the first active month, discounted afterwards.
    FirstMonth,
}

/// Where monthly rates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceChoice {
    /// Built-in 2025 table.
    #[default]
    Static,
    /// Rate cache, refreshed from the TCMB archive when one is given.
    Cache,
}

/// Net-to-gross invoice calculator for self-employed contractors in Turkey.
///
/// Finds the monthly invoice that leaves the requested net after income
/// tax, the Bağ-Kur premium and the accounting fee, month by month through
/// the year. Every option can also be set in a TOML file passed with
/// `--config`; flags given on the command line win.
#[derive(Debug, Default, Parser)]
#[command(name = "netbrut", version, about)]
pub struct Cli {
    /// Desired monthly net amount (e.g. 5000 or 5,000).
    #[arg(long, value_parser = parse_decimal)]
    pub net: Option<Decimal>,

    /// Currency of --net: EUR or TRY.
    #[arg(long)]
    pub currency: Option<Currency>,

    /// First month of activity, as 1-12 or a month name.
    #[arg(long, value_parser = parse_month)]
    pub start_month: Option<Month>,

    /// Year activity started; months before --start-month are skipped only
    /// when this equals --year.
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Year to calculate.
    #[arg(long)]
    pub year: Option<i32>,

    /// Premium rate policy.
    #[arg(long, value_enum)]
    pub premium: Option<PremiumChoice>,

    /// Flat premium rate (e.g. 0.3775); replaces --premium.
    #[arg(long, value_parser = parse_decimal)]
    pub premium_rate: Option<Decimal>,

    /// Add 20% VAT on top of the invoice.
    #[arg(long)]
    pub vat: bool,

    /// EUR/TRY rate to use for the current month.
    #[arg(long, value_parser = parse_decimal)]
    pub rate_override: Option<Decimal>,

    /// Rate substituted for months without a usable rate.
    #[arg(long, value_parser = parse_decimal)]
    pub current_rate: Option<Decimal>,

    /// Rate source.
    #[arg(long, value_enum)]
    pub source: Option<SourceChoice>,

    /// Cache backend for --source cache (memory or sqlite).
    #[arg(long)]
    pub cache_backend: Option<String>,

    /// Cache connection string. For SQLite a file path or `:memory:`.
    #[arg(long)]
    pub cache: Option<String>,

    /// Local mirror of the TCMB archive (`YYYYMM/DDMMYYYY.xml`).
    #[arg(long)]
    pub tcmb_archive: Option<PathBuf>,

    /// Currency of the printed amounts.
    #[arg(long)]
    pub display_currency: Option<Currency>,

    /// TOML settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `netbrut_core=trace`. Overrides RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Append log output to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
