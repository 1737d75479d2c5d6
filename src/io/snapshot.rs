//! Daily snapshot persistence.
//!
//! One CSV file per date (`<dir>/<YYYYMMDD>.csv`). Floats are written in their
//! shortest round-trip form, so reading a snapshot back reproduces it exactly.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{AggregatedHolding, DailySnapshot, compact};
use crate::error::{AppError, EXIT_USAGE};

/// Durable storage for one aggregation per calendar date.
pub trait SnapshotStore {
    /// Load the snapshot for `date`, or `None` when nothing was stored for it.
    fn read(&self, date: NaiveDate) -> Result<Option<DailySnapshot>, AppError>;

    /// Store `snapshot` under its date, replacing any previous one.
    fn write(&self, snapshot: &DailySnapshot) -> Result<PathBuf, AppError>;
}

/// CSV-file snapshot store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct CsvSnapshotStore {
    dir: PathBuf,
}

impl CsvSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.csv", compact(date)))
    }
}

impl SnapshotStore for CsvSnapshotStore {
    fn read(&self, date: NaiveDate) -> Result<Option<DailySnapshot>, AppError> {
        let path = self.path_for(date);
        if !path.exists() {
            debug!(path = %path.display(), "no snapshot on disk");
            return Ok(None);
        }

        let file = File::open(&path).map_err(|e| {
            AppError::new(EXIT_USAGE, format!("Failed to open snapshot '{}': {e}", path.display()))
        })?;
        let mut reader = csv::Reader::from_reader(file);

        let mut holdings = BTreeMap::new();
        for (idx, result) in reader.deserialize::<AggregatedHolding>().enumerate() {
            // +2: header line, then 1-based rows.
            let line = idx + 2;
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!(path = %path.display(), line, error = %e, "skipping malformed snapshot row");
                    continue;
                }
            };
            if row.fund_count == 0 || !row.total_weight.is_finite() {
                warn!(path = %path.display(), line, security = %row.security_id, "skipping invalid snapshot row");
                continue;
            }
            holdings.insert(row.security_id.clone(), row);
        }

        Ok(Some(DailySnapshot::new(date, holdings)))
    }

    fn write(&self, snapshot: &DailySnapshot) -> Result<PathBuf, AppError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::new(EXIT_USAGE, format!("Failed to create data dir '{}': {e}", self.dir.display()))
        })?;

        let path = self.path_for(snapshot.date);
        let tmp = path.with_extension("csv.tmp");

        let written = write_csv(&tmp, snapshot).and_then(|()| {
            fs::rename(&tmp, &path).map_err(|e| {
                AppError::new(EXIT_USAGE, format!("Failed to move snapshot into '{}': {e}", path.display()))
            })
        });
        if let Err(e) = written {
            if let Err(rm) = fs::remove_file(&tmp) {
                debug!(path = %tmp.display(), error = %rm, "no temporary snapshot to remove");
            }
            return Err(e);
        }
        Ok(path)
    }
}

fn write_csv(tmp: &Path, snapshot: &DailySnapshot) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(tmp)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create snapshot '{}': {e}", tmp.display())))?;
    // An empty snapshot still needs a header so it reads back as "present, empty".
    if snapshot.is_empty() {
        writer
            .write_record(["security_id", "security_name", "total_weight", "avg_weight", "fund_count"])
            .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write snapshot header: {e}")))?;
    }
    for row in snapshot.holdings.values() {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write snapshot row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to flush snapshot: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn holding(id: &str, name: &str, total: f64, count: usize) -> AggregatedHolding {
        AggregatedHolding {
            security_id: id.to_string(),
            security_name: name.to_string(),
            total_weight: total,
            avg_weight: total / count as f64,
            fund_count: count,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()
    }

    #[test]
    fn write_then_read_round_trips_exactly() {
        let dir = tempdir().unwrap();
        let store = CsvSnapshotStore::new(dir.path());

        let mut holdings = BTreeMap::new();
        for h in [
            holding("005930", "삼성전자", 0.1 + 0.2, 3),
            holding("000660", "SK하이닉스, Inc.", 100.0 / 3.0, 7),
            holding("KRD010010001", "원화예금 \"cash\"", 1e-7, 1),
            holding("035420", " NAVER Pref ", 2.5, 2),
        ] {
            holdings.insert(h.security_id.clone(), h);
        }
        let snapshot = DailySnapshot::new(date(), holdings);

        let path = store.write(&snapshot).unwrap();
        assert_eq!(path, dir.path().join("20250103.csv"));
        assert!(!dir.path().join("20250103.csv.tmp").exists());

        let back = store.read(date()).unwrap().unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn failed_write_leaves_no_temporary_file() {
        let dir = tempdir().unwrap();
        let store = CsvSnapshotStore::new(dir.path());
        // A non-empty directory where the snapshot belongs makes the final rename fail.
        let target = store.path_for(date());
        fs::create_dir_all(target.join("occupied")).unwrap();

        let mut holdings = BTreeMap::new();
        holdings.insert("A".to_string(), holding("A", "Alpha", 1.0, 1));
        assert!(store.write(&DailySnapshot::new(date(), holdings)).is_err());
        assert!(!dir.path().join("20250103.csv.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn missing_date_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = CsvSnapshotStore::new(dir.path().join("not-created-yet"));
        assert!(store.read(date()).unwrap().is_none());
    }

    #[test]
    fn empty_snapshot_reads_back_as_present() {
        let dir = tempdir().unwrap();
        let store = CsvSnapshotStore::new(dir.path());
        let empty = DailySnapshot::new(date(), BTreeMap::new());
        store.write(&empty).unwrap();
        assert_eq!(store.read(date()).unwrap(), Some(empty));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempdir().unwrap();
        let store = CsvSnapshotStore::new(dir.path());
        fs::write(
            store.path_for(date()),
            "security_id,security_name,total_weight,avg_weight,fund_count\n\
             A,Alpha,5.0,2.5,2\n\
             B,Beta,oops,1.0,1\n\
             C,Gamma,1.0,1.0,0\n",
        )
        .unwrap();

        let snapshot = store.read(date()).unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.holdings["A"].fund_count, 2);
    }
}
