//! Export the day-over-day diff to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use chrono::NaiveDate;

use crate::domain::DiffedHolding;
use crate::error::{AppError, EXIT_USAGE};

/// Write diff rows to a CSV file, in the order given.
pub fn write_diff_csv(path: &Path, date: NaiveDate, rows: &[DiffedHolding]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create '{}': {e}", parent.display())))?;
    }

    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    wtr.write_record([
        "date",
        "security_id",
        "security_name",
        "status",
        "today_weight",
        "prev_weight",
        "weight_delta",
    ])
    .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write export CSV header: {e}")))?;

    let date = date.to_string();
    for r in rows {
        wtr.write_record([
            date.as_str(),
            r.security_id.as_str(),
            r.security_name.as_str(),
            r.status.label(),
            &format!("{:.6}", r.today_weight),
            &format!("{:.6}", r.prev_weight),
            &format!("{:.6}", r.weight_delta),
        ])
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write export CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
