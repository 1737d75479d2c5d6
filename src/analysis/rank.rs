//! Ranked views over an aggregation and its diff, for reporting.

use std::collections::BTreeMap;

use crate::analysis::diff::by_delta_desc;
use crate::domain::{AggregatedHolding, DiffStatus, DiffedHolding};

/// The `n` largest holdings by total weight (ties: security id ascending).
pub fn top_holdings(holdings: &BTreeMap<String, AggregatedHolding>, n: usize) -> Vec<&AggregatedHolding> {
    let mut rows: Vec<&AggregatedHolding> = holdings.values().collect();
    rows.sort_by(|a, b| {
        b.total_weight
            .total_cmp(&a.total_weight)
            .then_with(|| a.security_id.cmp(&b.security_id))
    });
    rows.truncate(n);
    rows
}

/// The `n` largest strictly positive weight changes.
pub fn top_increases(diff: &[DiffedHolding], n: usize) -> Vec<&DiffedHolding> {
    let mut rows: Vec<&DiffedHolding> = diff.iter().filter(|d| d.weight_delta > 0.0).collect();
    rows.sort_by(|a, b| by_delta_desc(a, b));
    rows.truncate(n);
    rows
}

/// Securities held today but not yesterday, largest first.
pub fn new_entries(diff: &[DiffedHolding]) -> Vec<&DiffedHolding> {
    with_status(diff, DiffStatus::New)
}

/// Securities dropped since yesterday, largest previous weight first.
pub fn exits(diff: &[DiffedHolding]) -> Vec<&DiffedHolding> {
    let mut rows = with_status(diff, DiffStatus::Out);
    rows.sort_by(|a, b| {
        b.prev_weight
            .total_cmp(&a.prev_weight)
            .then_with(|| a.security_id.cmp(&b.security_id))
    });
    rows
}

fn with_status(diff: &[DiffedHolding], status: DiffStatus) -> Vec<&DiffedHolding> {
    let mut rows: Vec<&DiffedHolding> = diff.iter().filter(|d| d.status == status).collect();
    rows.sort_by(|a, b| by_delta_desc(a, b));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diff::diff_snapshots;

    fn map(rows: &[(&str, f64)]) -> BTreeMap<String, AggregatedHolding> {
        rows.iter()
            .map(|&(id, total)| {
                (
                    id.to_string(),
                    AggregatedHolding {
                        security_id: id.to_string(),
                        security_name: id.to_string(),
                        total_weight: total,
                        avg_weight: total,
                        fund_count: 1,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn top_holdings_orders_by_total_weight() {
        let m = map(&[("A", 1.0), ("B", 9.0), ("C", 4.0), ("D", 4.0)]);
        let ids: Vec<&str> = top_holdings(&m, 3).iter().map(|h| h.security_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C", "D"]);
        assert!(top_holdings(&m, 0).is_empty());
        assert_eq!(top_holdings(&m, 10).len(), 4);
    }

    #[test]
    fn increases_new_entries_and_exits() {
        let today = map(&[("A", 5.0), ("B", 2.0), ("N", 1.5)]);
        let yesterday = map(&[("A", 3.0), ("B", 4.0), ("X", 0.5), ("Y", 2.5)]);
        let diff = diff_snapshots(&today, Some(&yesterday));

        let inc: Vec<&str> = top_increases(&diff, 10).iter().map(|d| d.security_id.as_str()).collect();
        assert_eq!(inc, vec!["A", "N"]);
        assert_eq!(top_increases(&diff, 1).len(), 1);

        let new: Vec<&str> = new_entries(&diff).iter().map(|d| d.security_id.as_str()).collect();
        assert_eq!(new, vec!["N"]);

        let out: Vec<&str> = exits(&diff).iter().map(|d| d.security_id.as_str()).collect();
        assert_eq!(out, vec!["Y", "X"]);
    }
}
