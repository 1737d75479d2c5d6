//! Calendar helpers for locating the prior snapshot.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Date format used for snapshot/report file names and provider queries.
pub const COMPACT_DATE_FMT: &str = "%Y%m%d";

/// The business day before `date` (weekends skipped, holidays not modelled).
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut prev = date - Duration::days(1);
    while matches!(prev.weekday(), Weekday::Sat | Weekday::Sun) {
        prev -= Duration::days(1);
    }
    prev
}

/// Format a date as `YYYYMMDD`.
pub fn compact(date: NaiveDate) -> String {
    date.format(COMPACT_DATE_FMT).to_string()
}

/// Parse `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    const FMTS: [&str; 2] = [COMPACT_DATE_FMT, "%Y-%m-%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!("Invalid date '{s}'. Expected YYYYMMDD or YYYY-MM-DD."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monday_steps_back_to_friday() {
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let friday = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        assert_eq!(previous_business_day(monday), friday);
    }

    #[test]
    fn midweek_steps_back_one_day() {
        let wed = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        assert_eq!(previous_business_day(wed), NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
    }

    #[test]
    fn sunday_steps_back_to_friday() {
        let sunday = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(previous_business_day(sunday), NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    }

    #[test]
    fn parses_both_formats() {
        let want = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_date("20250314").unwrap(), want);
        assert_eq!(parse_date("2025-03-14").unwrap(), want);
        assert!(parse_date("14/03/2025").is_err());
        assert_eq!(compact(want), "20250314");
    }
}
