use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use ibex_governance::{latest_snapshot, load_snapshot_from_dir, save_snapshot, setup_database, Config};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("import") => run_import(&config, args.get(1).map(PathBuf::from)),
        Some("analyze") => run_analyze(&config, &args[1..]),
        _ => {
            eprintln!("usage: ibex-governance import [DATA_DIR]");
            eprintln!("       ibex-governance analyze [TICKER...]");
            std::process::exit(2);
        }
    }
}

/// Sheets -> joined companies -> snapshot cache
fn run_import(config: &Config, data_dir: Option<PathBuf>) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());

    let report = load_snapshot_from_dir(&data_dir)
        .with_context(|| format!("Failed to load sheets from {}", data_dir.display()))?;
    info!(summary = %report.summary(), "sheets joined");

    if report.orphan_directors + report.orphan_shareholders > 0 {
        warn!(
            directors = report.orphan_directors,
            shareholders = report.orphan_shareholders,
            "rows could not be matched to a company"
        );
    }

    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;
    setup_database(&conn)?;

    let outcome = save_snapshot(&conn, &report.companies)?;
    if outcome.was_saved() {
        println!("snapshot {} saved ({} companies)", outcome.meta().snapshot_id, outcome.meta().company_count);
    } else {
        println!("snapshot {} unchanged", outcome.meta().snapshot_id);
    }

    Ok(())
}

/// Cached snapshot -> network analysis as JSON on stdout
fn run_analyze(config: &Config, tickers: &[String]) -> Result<()> {
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;
    setup_database(&conn)?;

    let snapshot = latest_snapshot(&conn)?
        .context("No cached snapshot; run `ibex-governance import` first")?;

    let analyzer = config.analyzer();
    let analysis = if tickers.is_empty() {
        analyzer.analyze(&snapshot.companies)
    } else {
        let selected: HashSet<String> = tickers.iter().map(|t| t.trim().to_string()).collect();
        analyzer.analyze_selection(&snapshot.companies, &selected)
    };
    info!(summary = %analysis.summary(), snapshot_id = %snapshot.meta.snapshot_id, "analysis complete");

    println!("{}", serde_json::to_string_pretty(&analysis)?);

    Ok(())
}
