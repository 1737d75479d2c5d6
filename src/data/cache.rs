//! On-disk fetch cache.
//!
//! Each provider response is stored as one JSON file whose name is derived from
//! the query: `<kind>_<YYYYMMDD>[_<key>-<value>...].json`. There is no eviction;
//! an entry older than `max_age` is simply treated as a miss and overwritten.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::data::source::{FetchError, MarketDataSource};
use crate::domain::{FundPerformance, FundQuote, RawHolding, compact};

/// Identifies one cached provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    kind: &'static str,
    date: NaiveDate,
    params: Vec<(&'static str, String)>,
}

impl CacheKey {
    pub fn new(kind: &'static str, date: NaiveDate) -> Self {
        Self {
            kind,
            date,
            params: Vec::new(),
        }
    }

    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    /// File name for this key; characters outside `[A-Za-z0-9.-]` become `_`.
    pub fn file_name(&self) -> String {
        let mut name = format!("{}_{}", self.kind, compact(self.date));
        for (k, v) in &self.params {
            name.push('_');
            name.push_str(k);
            name.push('-');
            name.push_str(v);
        }
        let sanitized: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{sanitized}.json")
    }
}

/// A directory of JSON responses with an optional expiry.
#[derive(Debug, Clone)]
pub struct FetchCache {
    dir: PathBuf,
    max_age: Option<Duration>,
}

impl FetchCache {
    pub fn new(dir: impl Into<PathBuf>, max_age: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Look up an entry. Missing, expired and undecodable entries are all misses.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        if self.is_expired(&path) {
            debug!(path = %path.display(), "cache entry expired");
            return None;
        }
        let file = File::open(&path).ok()?;
        match serde_json::from_reader(file) {
            Ok(value) => {
                debug!(path = %path.display(), "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<(), FetchError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| FetchError::Cache(format!("Failed to create cache dir '{}': {e}", self.dir.display())))?;
        let path = self.path_for(key);
        let file = File::create(&path)
            .map_err(|e| FetchError::Cache(format!("Failed to create '{}': {e}", path.display())))?;
        serde_json::to_writer(BufWriter::new(file), value)
            .map_err(|e| FetchError::Cache(format!("Failed to write '{}': {e}", path.display())))?;
        Ok(())
    }

    fn is_expired(&self, path: &Path) -> bool {
        let Some(max_age) = self.max_age else { return false };
        let modified = fs::metadata(path).and_then(|m| m.modified());
        match modified {
            Ok(t) => SystemTime::now().duration_since(t).map(|age| age > max_age).unwrap_or(false),
            Err(_) => true,
        }
    }
}

/// Wraps a source so that successful responses are served from a `FetchCache`.
///
/// `NoData` answers are never cached: a date that is empty today may be
/// published later.
pub struct CachedSource<S> {
    inner: S,
    cache: FetchCache,
}

impl<S: MarketDataSource> CachedSource<S> {
    pub fn new(inner: S, cache: FetchCache) -> Self {
        Self { inner, cache }
    }

    fn cached<T, F>(&self, key: CacheKey, fetch: F) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, FetchError>,
    {
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let value = fetch()?;
        if let Err(e) = self.cache.put(&key, &value) {
            warn!(error = %e, "failed to store cache entry");
        }
        Ok(value)
    }
}

impl<S: MarketDataSource> MarketDataSource for CachedSource<S> {
    fn fund_universe(&self, date: NaiveDate, lookback_days: u32) -> Result<Vec<FundPerformance>, FetchError> {
        let key = CacheKey::new("universe", date).with("lookback", lookback_days);
        self.cached(key, || self.inner.fund_universe(date, lookback_days))
    }

    fn fund_quote(&self, fund: &FundPerformance, date: NaiveDate) -> Result<FundQuote, FetchError> {
        let key = CacheKey::new("quote", date).with("fund", &fund.ticker);
        self.cached(key, || self.inner.fund_quote(fund, date))
    }

    fn fund_holdings(&self, fund: &FundPerformance, date: NaiveDate) -> Result<Vec<RawHolding>, FetchError> {
        let key = CacheKey::new("holdings", date).with("fund", &fund.ticker);
        self.cached(key, || self.inner.fund_holdings(fund, date))
    }
}
