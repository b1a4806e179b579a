use anyhow::{Context, Result};
use bank_matching_lib::io::table::Table;
use bank_matching_lib::matching::manager::run_bank_matching;
use bank_matching_lib::utils::classification_filter::ClassificationFilterConfig;
use bank_matching_lib::utils::env::load_env;
use bank_matching_lib::utils::matching_config::MatchingConfig;
use bank_matching_lib::utils::progress_bars::progress_config::ProgressConfig;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Withdrawals/impacts CSV
    #[arg(long)]
    withdrawals: PathBuf,

    /// Banks/credit-providers CSV
    #[arg(long)]
    banks: PathBuf,

    /// Where to write the withdrawals with match columns appended
    #[arg(long, default_value = "matched_results.csv")]
    output: PathBuf,

    /// Minimum match score (0-100); overrides MATCH_THRESHOLD
    #[arg(long)]
    threshold: Option<u16>,

    /// Optional JSON file for the run summary
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Only match withdrawals whose credit classification names a wetland type
    #[arg(long)]
    wetlands_only: bool,
}

fn main() -> Result<()> {
    // Initialize logging and environment
    load_env();
    env_logger::init();
    let args = Args::parse();
    info!("Starting withdrawal -> bank matching");

    let mut config = MatchingConfig::from_env();
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    config.validate()?;
    config.log_config();

    let mut classification_filter = ClassificationFilterConfig::from_env();
    if args.wetlands_only {
        classification_filter.enabled = true;
    }
    classification_filter.log_config();

    let progress_config = ProgressConfig::from_env();
    let load_start = Instant::now();

    let mut withdrawals_table = Table::read_csv(&args.withdrawals)
        .context("Failed to load withdrawals table")?;
    let banks_table = Table::read_csv(&args.banks).context("Failed to load banks table")?;
    info!(
        "Loaded {} withdrawals and {} banks in {:.2?}",
        withdrawals_table.len(),
        banks_table.len(),
        load_start.elapsed()
    );

    if classification_filter.is_active() {
        let removed = withdrawals_table
            .retain_rows(&classification_filter.column, |value| {
                classification_filter.matches(value)
            })
            .context("Failed to apply classification filter")?;
        info!(
            "Classification filter removed {} rows, {} remain",
            removed,
            withdrawals_table.len()
        );
    }

    if withdrawals_table.is_empty() {
        warn!("No withdrawal rows to match; output will only contain the header");
    }
    if banks_table.is_empty() {
        warn!("Banks table has no rows; every withdrawal will be unmatched");
    }

    let withdrawals = withdrawals_table
        .to_records(&config.withdrawal_columns)
        .context("Failed to read withdrawal names/coordinates")?;
    let banks = banks_table
        .to_records(&config.bank_columns)
        .context("Failed to read bank names/coordinates")?;

    let output = run_bank_matching(
        &withdrawals,
        &banks,
        config.score_threshold(),
        &progress_config,
    );

    withdrawals_table
        .with_match_columns(&output.records)
        .write_csv(&args.output)
        .context("Failed to write matched results")?;
    info!("Results saved to '{}'", args.output.display());

    if let Some(summary_path) = &args.summary {
        let json = serde_json::to_string_pretty(&output.stats)
            .context("Failed to serialize run summary")?;
        std::fs::write(summary_path, json)
            .with_context(|| format!("Failed to write summary: {}", summary_path.display()))?;
        info!("Run summary saved to '{}'", summary_path.display());
    }

    info!("=== Matching Summary ===");
    info!("Run ID: {}", output.stats.run_id);
    info!(
        "Matched {}/{} withdrawals ({:.2}%)",
        output.stats.matched_records, output.stats.total_records, output.stats.match_rate
    );
    info!("Total execution time: {:.2?}", load_start.elapsed());
    Ok(())
}
