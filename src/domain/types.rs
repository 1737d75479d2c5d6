//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation and diffing
//! - persisted as daily snapshots (CSV) and fetch-cache entries (JSON)
//! - reloaded later for offline comparisons

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Name fragment that marks an actively managed ETF on KRX ("active").
pub const DEFAULT_NAME_FILTER: &str = "액티브";

/// One constituent row of one fund on one day, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRecord {
    pub fund_id: String,
    pub security_id: String,
    pub security_name: String,
    /// Weight of the security in the fund, in percent.
    pub weight: f64,
}

/// A constituent row exactly as the provider returned it.
///
/// Numbers stay as strings here; `io::ingest` owns parsing and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHolding {
    pub security_id: String,
    pub security_name: String,
    pub weight: Option<String>,
    /// Valuation amount, used to derive weights when the provider omits them.
    pub value_amount: Option<String>,
}

/// Per-security aggregation across every selected fund for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedHolding {
    pub security_id: String,
    pub security_name: String,
    pub total_weight: f64,
    pub avg_weight: f64,
    pub fund_count: usize,
}

/// All aggregated rows for one calendar date, keyed by security id.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub holdings: BTreeMap<String, AggregatedHolding>,
}

impl DailySnapshot {
    pub fn new(date: NaiveDate, holdings: BTreeMap<String, AggregatedHolding>) -> Self {
        Self { date, holdings }
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

/// Day-over-day membership of a security in the aggregated universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffStatus {
    /// Held today, not held yesterday.
    New,
    /// Held yesterday, not held today.
    Out,
    /// Held on both days.
    Maintain,
}

impl DiffStatus {
    pub fn label(self) -> &'static str {
        match self {
            DiffStatus::New => "New",
            DiffStatus::Out => "Out",
            DiffStatus::Maintain => "Maintain",
        }
    }
}

/// One row of the day-over-day comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffedHolding {
    pub security_id: String,
    pub security_name: String,
    pub status: DiffStatus,
    /// Today's total weight (0 when `Out`).
    pub today_weight: f64,
    /// Yesterday's total weight (0 when `New`).
    pub prev_weight: f64,
    pub weight_delta: f64,
}

/// A listed fund with its trailing return over the lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundPerformance {
    /// Short ticker (e.g. `441800`).
    pub ticker: String,
    /// Full ISIN; some provider endpoints only accept this form.
    pub isin: String,
    pub name: String,
    /// Trailing return in percent.
    pub trailing_return: f64,
}

/// End-of-day quote for one fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundQuote {
    pub open: f64,
    pub close: f64,
    pub nav: Option<f64>,
    pub volume: f64,
    pub trading_value: f64,
}

/// Fund-level metadata shown in the report overview.
#[derive(Debug, Clone, PartialEq)]
pub struct FundSummary {
    pub ticker: String,
    pub name: String,
    pub close: f64,
    pub nav: f64,
    pub volume: f64,
    pub trading_value: f64,
    /// Intraday change (close vs open), percent.
    pub change_pct: f64,
    pub trailing_return: f64,
}

impl FundSummary {
    pub fn from_quote(fund: &FundPerformance, quote: &FundQuote) -> Self {
        let change_pct = if quote.open > 0.0 {
            (quote.close - quote.open) / quote.open * 100.0
        } else {
            0.0
        };
        Self {
            ticker: fund.ticker.clone(),
            name: fund.name.clone(),
            close: quote.close,
            nav: quote.nav.unwrap_or(quote.close),
            volume: quote.volume,
            trading_value: quote.trading_value,
            change_pct,
            trailing_return: fund.trailing_return,
        }
    }
}

/// How the fund universe is narrowed before holdings are fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCriteria {
    /// Keep only the best `top_n` funds by trailing return (0 = no limit).
    pub top_n: usize,
    /// Minimum trailing return in percent.
    pub min_return: Option<f64>,
    /// Substring a fund name must contain (empty = keep all).
    pub name_filter: String,
    /// Window (calendar days) for the trailing return.
    pub lookback_days: u32,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            top_n: 20,
            min_return: None,
            name_filter: DEFAULT_NAME_FILTER.to_string(),
            lookback_days: 90,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub date: NaiveDate,
    pub selection: SelectionCriteria,

    pub data_dir: PathBuf,
    pub report_dir: PathBuf,

    /// `None` disables the fetch cache.
    pub cache_dir: Option<PathBuf>,
    /// Cache entries older than this are refetched (`None` = never expire).
    pub cache_max_age_hours: Option<u64>,

    /// Rows shown in each ranked table.
    pub report_top: usize,
    pub write_report: bool,
    pub write_chart: bool,
    /// Skip snapshot persistence.
    pub dry_run: bool,
    pub export_diff: Option<PathBuf>,
}
