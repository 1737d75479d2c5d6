//! Command-line parsing for the ETF consensus tracker.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the aggregation/diff code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_NAME_FILTER, parse_date};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "etfc",
    version,
    about = "Active ETF consensus holdings tracker (KRX)"
)]
pub struct Cli {
    /// Directory holding daily snapshots (`YYYYMMDD.csv`).
    #[arg(long, global = true, env = "ETFC_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory for Markdown reports and charts.
    #[arg(long, global = true, env = "ETFC_REPORT_DIR", default_value = "reports")]
    pub report_dir: PathBuf,

    /// Directory for the provider fetch cache.
    #[arg(long, global = true, env = "ETFC_CACHE_DIR", default_value = ".cache")]
    pub cache_dir: PathBuf,

    /// Log level (`info`, `debug`, ...) or a full filter directive.
    #[arg(long, global = true, env = "ETFC_LOG", default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch holdings, aggregate, diff against the prior business day, report and store.
    ///
    /// This is the default when no subcommand is given.
    Run(RunArgs),
    /// Print a stored snapshot.
    Show(ShowArgs),
    /// Diff two stored snapshots without touching the provider.
    Diff(DiffArgs),
}

/// Options for the daily run.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Target date (YYYYMMDD or YYYY-MM-DD). Defaults to today.
    #[arg(short = 'd', long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Keep the best N funds by trailing return (0 = all).
    #[arg(short = 'n', long, default_value_t = 20)]
    pub top_n: usize,

    /// Minimum trailing return in percent.
    #[arg(long)]
    pub min_returns: Option<f64>,

    /// Substring a fund name must contain (empty = no filter).
    #[arg(long, default_value = DEFAULT_NAME_FILTER)]
    pub name_filter: String,

    /// Trailing-return window in calendar days.
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u32).range(1..=3650))]
    pub lookback_days: u32,

    /// Rows shown in each ranked table.
    #[arg(long, default_value_t = 10)]
    pub report_top: usize,

    /// Always hit the provider; do not read or write the fetch cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Refetch cache entries older than this many hours.
    #[arg(long)]
    pub cache_max_age_hours: Option<u64>,

    /// Skip writing the Markdown report.
    #[arg(long)]
    pub no_report: bool,

    /// Skip rendering the returns chart.
    #[arg(long)]
    pub no_chart: bool,

    /// Compute and print everything, but do not store today's snapshot.
    #[arg(long)]
    pub dry_run: bool,

    /// Export the full diff to CSV.
    #[arg(long = "export-diff", value_name = "CSV")]
    pub export_diff: Option<PathBuf>,
}

/// Options for printing a stored snapshot.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Snapshot date (YYYYMMDD or YYYY-MM-DD).
    #[arg(short = 'd', long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// Rows to print (0 = all).
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}

/// Options for an offline diff.
#[derive(Debug, Args)]
pub struct DiffArgs {
    /// The "today" side.
    #[arg(short = 'd', long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// The "yesterday" side. Defaults to the previous business day.
    #[arg(long, value_parser = parse_date)]
    pub against: Option<NaiveDate>,

    /// Rows shown in each ranked table.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Export the full diff to CSV.
    #[arg(long = "export-diff", value_name = "CSV")]
    pub export_diff: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["etfc", "run"]).unwrap();
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.date, None);
        assert_eq!(args.top_n, 20);
        assert_eq!(args.name_filter, DEFAULT_NAME_FILTER);
        assert_eq!(args.lookback_days, 90);
        assert!(!args.dry_run);
    }

    #[test]
    fn run_flags_and_global_dirs() {
        let cli = Cli::try_parse_from([
            "etfc",
            "run",
            "--date",
            "2025-01-06",
            "--top-n",
            "5",
            "--min-returns",
            "3.5",
            "--name-filter",
            "",
            "--data-dir",
            "/tmp/snapshots",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/snapshots"));
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2025, 1, 6));
        assert_eq!(args.top_n, 5);
        assert_eq!(args.min_returns, Some(3.5));
        assert_eq!(args.name_filter, "");
        assert!(args.dry_run);
    }

    #[test]
    fn lookback_days_outside_ten_years_is_rejected() {
        assert!(Cli::try_parse_from(["etfc", "run", "--lookback-days", "0"]).is_err());
        assert!(Cli::try_parse_from(["etfc", "run", "--lookback-days", "99999"]).is_err());
        let cli = Cli::try_parse_from(["etfc", "run", "--lookback-days", "3650"]).unwrap();
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.lookback_days, 3650);
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["etfc", "show", "--date", "06/01/2025"]).is_err());
    }
}
