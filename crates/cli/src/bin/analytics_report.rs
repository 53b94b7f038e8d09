//! Analytics report - compute one (or every) report from a dataset snapshot.
//!
//! Run: analytics-report --dataset demos/sample-dataset.json [--report restock-recommendations] [--as-of 2024-03-20T18:00:00Z]
//! Reports: all, revenue-forecast, financial-metrics, inventory-report,
//!          restock-recommendations, menu-profitability, anomalies
//!
//! The dataset file is `{ transactions, inventory, shifts, menuItems }`.
//! Reports are printed to stdout as JSON; logs go to stderr.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::info;

use bistro_analytics::{Report, ReportKind};
use bistro_infra::{AnalyticsConfig, AnalyticsDataset, AnalyticsService, InMemoryAnalyticsRepository};

/// Restaurant analytics report generator
#[derive(Parser, Debug)]
#[command(name = "analytics-report")]
#[command(about = "Compute restaurant analytics reports from a JSON dataset snapshot")]
struct Args {
    /// Dataset snapshot (JSON)
    #[arg(long)]
    dataset: PathBuf,

    /// Report kind, or "all"
    #[arg(long, default_value = "all")]
    report: String,

    /// Reference instant (RFC 3339); defaults to now
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short)]
    verbose: bool,
}

fn selected_kinds(selector: &str) -> Result<Vec<ReportKind>> {
    if selector == "all" {
        return Ok(ReportKind::ALL.to_vec());
    }
    let kind = selector
        .parse::<ReportKind>()
        .with_context(|| format!("--report must be 'all' or one of: {}", kind_names()))?;
    Ok(vec![kind])
}

fn kind_names() -> String {
    ReportKind::ALL
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn load_dataset(path: &PathBuf) -> Result<AnalyticsDataset> {
    let file = File::open(path).with_context(|| format!("opening dataset {}", path.display()))?;
    let dataset: AnalyticsDataset = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing dataset {}", path.display()))?;
    Ok(dataset)
}

fn main() -> Result<()> {
    let args = Args::parse();
    bistro_observability::init_with_default_level(if args.verbose { "debug" } else { "info" });

    let kinds = selected_kinds(&args.report)?;
    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let config = AnalyticsConfig::from_env();

    let dataset = load_dataset(&args.dataset)?;
    info!(
        transactions = dataset.transactions.len(),
        inventory = dataset.inventory.len(),
        shifts = dataset.shifts.len(),
        menu_items = dataset.menu_items.len(),
        "dataset loaded"
    );
    let repo = InMemoryAnalyticsRepository::from_dataset(dataset).context("validating dataset")?;
    let service = AnalyticsService::new(Arc::new(repo), config);

    let reports: Vec<Report> = kinds.into_iter().map(|kind| service.report(kind, as_of)).collect();
    let output = match reports.as_slice() {
        [single] => single.to_json_pretty()?,
        _ => serde_json::to_string_pretty(&reports)?,
    };
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_selects_every_kind() {
        assert_eq!(selected_kinds("all").unwrap(), ReportKind::ALL.to_vec());
        assert_eq!(selected_kinds("anomalies").unwrap(), vec![ReportKind::Anomalies]);
        let err = selected_kinds("weekly").unwrap_err();
        assert!(format!("{err:#}").contains("restock-recommendations"));
    }

    #[test]
    fn args_parse_as_of() {
        let args = Args::parse_from([
            "analytics-report",
            "--dataset",
            "snapshot.json",
            "--as-of",
            "2024-03-20T18:00:00Z",
        ]);
        assert_eq!(args.report, "all");
        assert_eq!(args.as_of.unwrap().to_rfc3339(), "2024-03-20T18:00:00+00:00");
    }
}
