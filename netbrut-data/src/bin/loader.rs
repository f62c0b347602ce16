use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use netbrut_data::MonthlyRateLoader;
use netbrut_db_sqlite::SqliteRateCache;

/// Load monthly EUR→TRY rates from a CSV file into the rate cache.
///
/// The CSV file should have the following columns:
/// - year: The calendar year (e.g., 2025)
/// - month: The month number, 1-12
/// - rate: The EUR→TRY selling rate
/// - rate_date: The bulletin date, YYYY-MM-DD (empty for the 20th)
#[derive(Parser, Debug)]
#[command(name = "netbrut-rate-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing monthly rates
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL (e.g., sqlite:rates.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:rates.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Remove every cached rate before loading
    #[arg(long, default_value_t = false)]
    replace: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cache = SqliteRateCache::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        cache
            .run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if args.replace {
        println!("Clearing cached rates...");
        netbrut_core::RateCache::clear(&cache)
            .await
            .context("Failed to clear rate cache")?;
    }

    println!("Loading monthly rates from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = MonthlyRateLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let stored = MonthlyRateLoader::load(&cache, &records)
        .await
        .context("Failed to load monthly rates into database")?;

    println!("Successfully loaded {} monthly rates into the database.", stored);

    Ok(())
}
