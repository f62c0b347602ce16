//! End-to-end runs driven by an on-disk settings file.

use std::path::{Path, PathBuf};

use chrono::{Month, NaiveDate};
use netbrut_cli::app;
use netbrut_cli::cli::{Cli, PremiumChoice};
use netbrut_cli::report::Report;
use netbrut_cli::settings::{FileSettings, Settings};
use netbrut_core::Currency;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("netbrut.toml")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

#[test]
fn test_fixture_resolves() {
    let file = FileSettings::load(&fixture_path()).expect("fixture should load");

    let settings = Settings::resolve(&Cli::default(), file, today()).unwrap();

    assert_eq!(settings.net, dec!(4000));
    assert_eq!(settings.start_month, Month::April);
    assert_eq!(settings.year, 2025);
    assert_eq!(settings.premium, PremiumChoice::FirstMonth);
    assert!(settings.include_vat);
    assert_eq!(settings.display_currency, Currency::Eur);
    assert_eq!(settings.log_level.as_deref(), Some("warn"));
}

#[tokio::test]
async fn test_fixture_runs_april_to_december() {
    let file = FileSettings::load(&fixture_path()).unwrap();
    let settings = Settings::resolve(&Cli::default(), file, today()).unwrap();

    let result = app::run(&settings).await.expect("static run succeeds");

    assert_eq!(result.months.len(), 9);
    assert_eq!(result.months[0].label, "Nisan");
    // First active month pays the full rate, the rest the discounted one.
    assert_eq!(result.months[0].premium_rate, dec!(0.3775));
    assert!(result.months[1..].iter().all(|m| m.premium_rate == dec!(0.3275)));
    assert!((result.totals.totals_eur.net - dec!(36000)).abs() < dec!(0.05));

    let report = Report::new(&result, settings.display_currency).to_string();
    assert!(report.contains("Invoice+VAT"));
    assert!(report.contains("amounts in EUR"));
}

#[tokio::test]
async fn test_flag_overrides_fixture() {
    let file = FileSettings::load(&fixture_path()).unwrap();
    let cli = Cli {
        start_month: Some(Month::November),
        premium_rate: Some(dec!(0.30)),
        ..Cli::default()
    };
    let settings = Settings::resolve(&cli, file, today()).unwrap();

    let result = app::run(&settings).await.unwrap();

    assert_eq!(result.months.len(), 2);
    assert!(result.months.iter().all(|m| m.premium_rate == dec!(0.30)));
}
