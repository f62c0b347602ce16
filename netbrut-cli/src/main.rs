use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::debug;

use netbrut_cli::cli::Cli;
use netbrut_cli::report::Report;
use netbrut_cli::settings::{FileSettings, Settings};
use netbrut_cli::{app, logging};

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };
    let settings = Settings::resolve(&cli, file, Local::now().date_naive())
        .context("Invalid settings")?;

    logging::init_logging(settings.log_level.as_deref(), settings.log_file.as_deref())?;
    debug!(?settings, "resolved settings");

    let result = app::run(&settings).await?;
    print!("{}", Report::new(&result, settings.display_currency));

    Ok(())
}
