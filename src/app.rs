//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the daily pipeline
//! - prints summaries/tables
//! - writes the report, chart and optional exports
//! - stores today's snapshot

use chrono::NaiveDate;
use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Cli, Command, DiffArgs, RunArgs, ShowArgs};
use crate::domain::{DailySnapshot, RunConfig, SelectionCriteria, previous_business_day};
use crate::error::{AppError, EXIT_NO_DATA, EXIT_UPSTREAM};
use crate::io::snapshot::{CsvSnapshotStore, SnapshotStore};

pub mod pipeline;

use pipeline::PersistOutcome;

/// Entry point for the `etfc` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` first so clap's `env = ...` defaults can see it.
    dotenvy::dotenv().ok();

    // We want `etfc` and `etfc --date 20250106` to behave like `etfc run ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    crate::logging::init_logging(&cli.log);

    match &cli.command {
        Command::Run(args) => handle_run(&cli, args),
        Command::Show(args) => handle_show(&cli, args),
        Command::Diff(args) => handle_diff(&cli, args),
    }
}

fn handle_run(cli: &Cli, args: &RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(cli, args);
    info!(date = %config.date, "starting daily run");

    let (run, store) = pipeline::run_daily(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));
    if !run.summaries.is_empty() {
        println!("{}", crate::report::format_fund_table(&run.summaries));
        println!("{}", crate::plot::render_returns_chart(&run.summaries, 50));
    }
    println!("{}", crate::report::format_rankings(&run, config.report_top));

    let top = crate::analysis::top_holdings(&run.snapshot.holdings, config.report_top);
    if !top.is_empty() {
        println!("{}", crate::plot::render_holdings_chart(&top, 50));
    }

    // Report artifacts.
    let chart = if config.write_chart && !run.summaries.is_empty() {
        let name = crate::report::chart_file_name(&run);
        let path = config.report_dir.join(&name);
        crate::report::write_returns_chart(&path, &run.summaries, run.date)?;
        info!(path = %path.display(), "chart written");
        Some(name)
    } else {
        None
    };
    if config.write_report {
        let path = crate::report::write_report(&config.report_dir, &run, config.report_top, chart.as_deref())?;
        info!(path = %path.display(), "report written");
        println!("Report: {}", path.display());
    }

    if let Some(path) = &config.export_diff {
        crate::io::export::write_diff_csv(path, run.date, &run.diff)?;
        info!(path = %path.display(), rows = run.diff.len(), "diff exported");
    }

    match pipeline::persist_snapshot(&run, &store, config.dry_run)? {
        PersistOutcome::Written(path) => {
            println!("Snapshot: {}", path.display());
            Ok(())
        }
        PersistOutcome::DryRun => Ok(()),
        PersistOutcome::Incomplete { failed } => Err(AppError::new(
            EXIT_UPSTREAM,
            format!("Holdings fetch failed for {failed} fund(s); snapshot for {} not stored.", run.date),
        )),
    }
}

fn handle_show(cli: &Cli, args: &ShowArgs) -> Result<(), AppError> {
    let store = CsvSnapshotStore::new(&cli.data_dir);
    let snapshot = read_required(&store, args.date)?;

    let n = if args.top == 0 { snapshot.len() } else { args.top };
    let rows = crate::analysis::top_holdings(&snapshot.holdings, n);

    println!("Snapshot {} ({} securities)", snapshot.date, snapshot.len());
    println!("{}", crate::report::format_holdings_table(&rows));
    Ok(())
}

fn handle_diff(cli: &Cli, args: &DiffArgs) -> Result<(), AppError> {
    let store = CsvSnapshotStore::new(&cli.data_dir);
    let against = args.against.unwrap_or_else(|| previous_business_day(args.date));

    let today = read_required(&store, args.date)?;
    let yesterday = store.read(against)?;
    if yesterday.is_none() {
        warn!(date = %against, "no snapshot to compare against; every holding is new");
    }
    let diff = crate::analysis::diff_snapshots(&today.holdings, yesterday.as_ref().map(|s| &s.holdings));

    println!("Diff {} vs {}", args.date, against);
    println!(
        "{}",
        crate::report::format_diff_table(&crate::analysis::top_increases(&diff, args.top))
    );
    if yesterday.is_some() {
        let new = crate::analysis::new_entries(&diff);
        println!("New entries ({}):\n{}", new.len(), crate::report::format_diff_table(&new));
        let exits = crate::analysis::exits(&diff);
        println!("Exits ({}):\n{}", exits.len(), crate::report::format_diff_table(&exits));
    }

    if let Some(path) = &args.export_diff {
        crate::io::export::write_diff_csv(path, args.date, &diff)?;
    }
    Ok(())
}

fn read_required<S: SnapshotStore>(store: &S, date: NaiveDate) -> Result<DailySnapshot, AppError> {
    store
        .read(date)?
        .ok_or_else(|| AppError::new(EXIT_NO_DATA, format!("No stored snapshot for {date}.")))
}

pub fn run_config_from_args(cli: &Cli, args: &RunArgs) -> RunConfig {
    RunConfig {
        date: args.date.unwrap_or_else(|| chrono::Local::now().date_naive()),
        selection: SelectionCriteria {
            top_n: args.top_n,
            min_return: args.min_returns,
            name_filter: args.name_filter.clone(),
            lookback_days: args.lookback_days,
        },
        data_dir: cli.data_dir.clone(),
        report_dir: cli.report_dir.clone(),
        cache_dir: (!args.no_cache).then(|| cli.cache_dir.clone()),
        cache_max_age_hours: args.cache_max_age_hours,
        report_top: args.report_top,
        write_report: !args.no_report,
        write_chart: !args.no_chart && !args.no_report,
        dry_run: args.dry_run,
        export_diff: args.export_diff.clone(),
    }
}

/// Rewrite argv so `etfc` defaults to `etfc run`.
///
/// Rules:
/// - `etfc`                      -> `etfc run`
/// - `etfc --date 20250106 ...`  -> `etfc run --date 20250106 ...`
/// - `etfc --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "show" | "diff");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_run() {
        assert_eq!(rewrite_args(argv(&["etfc"])), argv(&["etfc", "run"]));
        assert_eq!(
            rewrite_args(argv(&["etfc", "--date", "20250106"])),
            argv(&["etfc", "run", "--date", "20250106"])
        );
        assert_eq!(rewrite_args(argv(&["etfc", "show", "-d", "20250106"])), argv(&["etfc", "show", "-d", "20250106"]));
        assert_eq!(rewrite_args(argv(&["etfc", "--help"])), argv(&["etfc", "--help"]));
    }

    #[test]
    fn config_from_args_maps_flags() {
        let cli = Cli::parse_from(rewrite_args(argv(&[
            "etfc",
            "--date",
            "20250106",
            "--no-cache",
            "--no-report",
            "--min-returns",
            "5",
            "--cache-dir",
            "c",
        ])));
        let Command::Run(args) = &cli.command else { panic!("expected run") };
        let config = run_config_from_args(&cli, args);

        assert_eq!(config.date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(config.cache_dir, None);
        assert!(!config.write_report);
        assert!(!config.write_chart);
        assert_eq!(config.selection.min_return, Some(5.0));
        assert_eq!(config.selection.top_n, 20);
    }
}
