//! The data-fetch seam between the pipeline and a market-data provider.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{FundPerformance, FundQuote, RawHolding};

/// Errors surfaced by a `MarketDataSource`.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The provider answered, but has nothing for this date (e.g. a non-trading day).
    #[error("No data available for {what} on {date}")]
    NoData { what: String, date: String },

    /// HTTP transport failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Provider returned status {status} for {what}")]
    Status { status: u16, what: String },

    /// The response could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A fetch-cache entry could not be written.
    #[error("Cache error: {0}")]
    Cache(String),
}

impl FetchError {
    pub fn no_data(what: impl Into<String>, date: NaiveDate) -> Self {
        FetchError::NoData {
            what: what.into(),
            date: crate::domain::compact(date),
        }
    }

    /// `true` for "nothing to fetch", `false` for failures worth reporting as incomplete.
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::NoData { .. })
    }
}

/// Everything the pipeline needs from a market-data provider.
///
/// Implementations are blocking; the pipeline is strictly sequential.
pub trait MarketDataSource {
    /// All listed funds with their trailing return over `lookback_days` ending at `date`.
    fn fund_universe(&self, date: NaiveDate, lookback_days: u32) -> Result<Vec<FundPerformance>, FetchError>;

    /// End-of-day quote for one fund.
    fn fund_quote(&self, fund: &FundPerformance, date: NaiveDate) -> Result<FundQuote, FetchError>;

    /// Constituents of one fund as published for `date`.
    fn fund_holdings(&self, fund: &FundPerformance, date: NaiveDate) -> Result<Vec<RawHolding>, FetchError>;
}

impl<S: MarketDataSource + ?Sized> MarketDataSource for &S {
    fn fund_universe(&self, date: NaiveDate, lookback_days: u32) -> Result<Vec<FundPerformance>, FetchError> {
        (**self).fund_universe(date, lookback_days)
    }

    fn fund_quote(&self, fund: &FundPerformance, date: NaiveDate) -> Result<FundQuote, FetchError> {
        (**self).fund_quote(fund, date)
    }

    fn fund_holdings(&self, fund: &FundPerformance, date: NaiveDate) -> Result<Vec<RawHolding>, FetchError> {
        (**self).fund_holdings(fund, date)
    }
}

impl<S: MarketDataSource + ?Sized> MarketDataSource for Box<S> {
    fn fund_universe(&self, date: NaiveDate, lookback_days: u32) -> Result<Vec<FundPerformance>, FetchError> {
        (**self).fund_universe(date, lookback_days)
    }

    fn fund_quote(&self, fund: &FundPerformance, date: NaiveDate) -> Result<FundQuote, FetchError> {
        (**self).fund_quote(fund, date)
    }

    fn fund_holdings(&self, fund: &FundPerformance, date: NaiveDate) -> Result<Vec<RawHolding>, FetchError> {
        (**self).fund_holdings(fund, date)
    }
}
