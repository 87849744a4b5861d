use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nba_sheets::config::Config;
use nba_sheets::export::write_debug_workbook;
use nba_sheets::google_sheets::{GoogleSheetsStore, ServiceKey};
use nba_sheets::http_client::HttpFetcher;
use nba_sheets::memory_store::MemoryStore;
use nba_sheets::runner::{RunReport, run};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config_path = parse_path_arg(&args, "--config");
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(path) = parse_path_arg(&args, "--dump") {
        config.debug_dump = Some(path);
    }
    let dry_run = args.iter().any(|a| a == "--dry-run");

    let fetcher = HttpFetcher::new(config.http);
    let report = if dry_run {
        info!("dry run, writing to an in-memory store");
        let mut store = MemoryStore::new().with_sheet(&config.responses_sheet, Vec::new());
        run(&config, &fetcher, &mut store)
    } else {
        let sheet_id = config
            .sheet_id
            .clone()
            .context("SHEET_ID is not configured")?;
        let key = ServiceKey::load(&config.service_key_path)?;
        let mut store = GoogleSheetsStore::connect(&sheet_id, key, config.http)
            .context("failed to connect to spreadsheet")?;
        run(&config, &fetcher, &mut store)
    };

    dump(&config, &report);
    report.ensure_complete()
}

fn dump(config: &Config, report: &RunReport) {
    let Some(path) = config.debug_dump.as_ref() else {
        return;
    };
    match write_debug_workbook(path, &report.tables) {
        Ok(()) => info!(path = %path.display(), "wrote debug workbook"),
        Err(err) => warn!(path = %path.display(), "debug workbook failed: {err:#}"),
    }
}

fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
