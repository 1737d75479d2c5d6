//! Shared daily-run pipeline used by the `run` command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch universe -> select funds -> fetch holdings -> aggregate -> diff vs prior snapshot
//!
//! Persistence is a separate step (`persist_snapshot`) so callers can render
//! reports first and so `--dry-run` never touches the data directory.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::analysis::{aggregate, diff_snapshots, select_funds};
use crate::data::{CachedSource, FetchCache, FetchError, KrxClient, MarketDataSource};
use crate::domain::{
    DailySnapshot, DiffedHolding, FundPerformance, FundSummary, HoldingRecord, RunConfig,
    previous_business_day,
};
use crate::error::{AppError, EXIT_NO_DATA, EXIT_UPSTREAM};
use crate::io::ingest::normalize_holdings;
use crate::io::snapshot::{CsvSnapshotStore, SnapshotStore};

/// A selected fund whose holdings could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct FundFailure {
    pub ticker: String,
    pub name: String,
    pub error: String,
}

/// Counters reported in the run summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub funds_in_universe: usize,
    pub funds_selected: usize,
    pub funds_with_holdings: usize,
    /// Funds the provider had no holdings for (not a failure).
    pub funds_without_data: usize,
    pub funds_failed: usize,
    pub rows_read: usize,
    pub records_used: usize,
    /// Provider rows rejected during normalization or aggregation.
    pub rows_skipped: usize,
}

/// All computed outputs of a single daily run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub date: NaiveDate,
    pub prev_date: NaiveDate,
    pub funds: Vec<FundPerformance>,
    pub summaries: Vec<FundSummary>,
    pub snapshot: DailySnapshot,
    /// `None` on a first run (no stored snapshot for `prev_date`).
    pub previous: Option<DailySnapshot>,
    pub diff: Vec<DiffedHolding>,
    pub failures: Vec<FundFailure>,
    pub stats: RunStats,
}

impl RunOutput {
    /// Every selected fund's holdings were fetched (or were legitimately absent).
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What happened to today's snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Written(PathBuf),
    DryRun,
    /// Not written because some holdings fetches failed.
    Incomplete { failed: usize },
}

/// Build the market-data source for `config` (KRX, optionally behind the fetch cache).
pub fn build_source(config: &RunConfig) -> Result<Box<dyn MarketDataSource>, AppError> {
    let client = KrxClient::from_env()?;
    match &config.cache_dir {
        Some(dir) => {
            let max_age = config.cache_max_age_hours.map(|h| Duration::from_secs(h * 3600));
            info!(dir = %dir.display(), ?max_age, "fetch cache enabled");
            Ok(Box::new(CachedSource::new(client, FetchCache::new(dir, max_age))))
        }
        None => Ok(Box::new(client)),
    }
}

/// Execute the full daily pipeline against the live provider and the CSV store.
pub fn run_daily(config: &RunConfig) -> Result<(RunOutput, CsvSnapshotStore), AppError> {
    let source = build_source(config)?;
    let store = CsvSnapshotStore::new(&config.data_dir);
    let output = run_daily_with(config, &source, &store)?;
    Ok((output, store))
}

/// Execute the daily pipeline with explicit collaborators.
pub fn run_daily_with<S, St>(config: &RunConfig, source: &S, store: &St) -> Result<RunOutput, AppError>
where
    S: MarketDataSource + ?Sized,
    St: SnapshotStore + ?Sized,
{
    let date = config.date;
    let prev_date = previous_business_day(date);
    let mut stats = RunStats::default();

    // 1) Fund universe with trailing returns.
    let universe = source.fund_universe(date, config.selection.lookback_days)?;
    stats.funds_in_universe = universe.len();

    // 2) Narrow to the funds we aggregate.
    let funds = select_funds(&universe, &config.selection);
    stats.funds_selected = funds.len();
    info!(
        date = %date,
        universe = universe.len(),
        selected = funds.len(),
        "selected funds"
    );

    // 3) Per-fund quote and holdings.
    let mut summaries = Vec::with_capacity(funds.len());
    let mut records: Vec<HoldingRecord> = Vec::new();
    let mut failures = Vec::new();

    for fund in &funds {
        match source.fund_quote(fund, date) {
            Ok(quote) => summaries.push(FundSummary::from_quote(fund, &quote)),
            Err(e) => warn!(fund = %fund.ticker, error = %e, "quote unavailable"),
        }

        match source.fund_holdings(fund, date) {
            Ok(raw) => {
                let normalized = normalize_holdings(&fund.ticker, &raw);
                for err in &normalized.row_errors {
                    warn!(
                        fund = %err.fund_id,
                        row = err.row,
                        security = err.security_id.as_deref().unwrap_or(""),
                        "{}",
                        err.message
                    );
                }
                if normalized.derived_weights {
                    info!(fund = %fund.ticker, "weights derived from valuation amounts");
                }
                stats.rows_read += normalized.rows_read;
                stats.rows_skipped += normalized.row_errors.len();
                if normalized.records.is_empty() {
                    stats.funds_without_data += 1;
                } else {
                    stats.funds_with_holdings += 1;
                }
                records.extend(normalized.records);
            }
            Err(e @ FetchError::NoData { .. }) => {
                warn!(fund = %fund.ticker, error = %e, "no holdings published");
                stats.funds_without_data += 1;
            }
            Err(e) => {
                warn!(fund = %fund.ticker, error = %e, "holdings fetch failed");
                failures.push(FundFailure {
                    ticker: fund.ticker.clone(),
                    name: fund.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    stats.funds_failed = failures.len();

    if !funds.is_empty() && stats.funds_with_holdings == 0 {
        if let Some(first) = failures.first() {
            return Err(AppError::new(
                EXIT_UPSTREAM,
                format!(
                    "Holdings fetch failed for all {} selected fund(s); first error: {}",
                    funds.len(),
                    first.error
                ),
            ));
        }
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("No holdings published on {date} for any of the {} selected fund(s).", funds.len()),
        ));
    }

    // 4) Aggregate across funds.
    let aggregation = aggregate(&records);
    stats.rows_skipped += aggregation.skipped;
    stats.records_used = records.len() - aggregation.skipped;
    let snapshot = DailySnapshot::new(date, aggregation.holdings);
    info!(records = stats.records_used, securities = snapshot.len(), "aggregated holdings");

    // 5) Diff against the prior business day.
    let previous = store.read(prev_date)?;
    if previous.is_none() {
        info!(prev_date = %prev_date, "no prior snapshot; every holding is new");
    }
    let diff = diff_snapshots(&snapshot.holdings, previous.as_ref().map(|p| &p.holdings));

    Ok(RunOutput {
        date,
        prev_date,
        funds,
        summaries,
        snapshot,
        previous,
        diff,
        failures,
        stats,
    })
}

/// Store today's snapshot unless the run is a dry run or incomplete.
pub fn persist_snapshot<St>(output: &RunOutput, store: &St, dry_run: bool) -> Result<PersistOutcome, AppError>
where
    St: SnapshotStore + ?Sized,
{
    if dry_run {
        info!("dry run; snapshot not written");
        return Ok(PersistOutcome::DryRun);
    }
    if !output.is_complete() {
        warn!(
            failed = output.failures.len(),
            "holdings incomplete; snapshot not written"
        );
        return Ok(PersistOutcome::Incomplete {
            failed: output.failures.len(),
        });
    }
    let path = store.write(&output.snapshot)?;
    info!(path = %path.display(), securities = output.snapshot.len(), "snapshot written");
    Ok(PersistOutcome::Written(path))
}
