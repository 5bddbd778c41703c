mod config;
mod db;
mod error;
mod expenses;
mod goals;
mod import;
mod insights;
mod ledger;
mod models;
mod run;
mod ui;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use config::Config;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (overrides, args) = config::split_global_flags(&args)?;
    let config = Config::load(overrides)?;

    let tui = args.is_empty();
    init_logging(&config, tui)?;
    tracing::debug!(user = %config.user, db = %config.database.display(), "Starting cashcraft");

    let mut db = db::Database::open(&config.database)?;

    match args.len() {
        0 => run::as_tui(&config, &mut db),
        _ => run::as_cli(&args, &config, &mut db),
    }
}

/// `CASHCRAFT_LOG` wins over the configured level. The TUI owns the terminal,
/// so its events go to a file in the data directory.
fn init_logging(config: &Config, tui: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env("CASHCRAFT_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL));

    let result = if tui {
        let path = config.log_file();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))
}
