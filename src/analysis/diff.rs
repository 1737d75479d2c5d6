//! Day-over-day comparison of two aggregations.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{AggregatedHolding, DiffStatus, DiffedHolding};

/// Join today's aggregation with yesterday's by security id.
///
/// `yesterday = None` (first run) classifies every security as `New`.
/// Rows come back sorted by weight delta descending, ties by security id.
pub fn diff_snapshots(
    today: &BTreeMap<String, AggregatedHolding>,
    yesterday: Option<&BTreeMap<String, AggregatedHolding>>,
) -> Vec<DiffedHolding> {
    let empty = BTreeMap::new();
    let yesterday = yesterday.unwrap_or(&empty);

    let ids: BTreeSet<&String> = today.keys().chain(yesterday.keys()).collect();

    let mut rows: Vec<DiffedHolding> = ids
        .into_iter()
        .filter_map(|id| match (today.get(id), yesterday.get(id)) {
            (Some(t), Some(y)) => Some(DiffedHolding {
                security_id: id.clone(),
                security_name: t.security_name.clone(),
                status: DiffStatus::Maintain,
                today_weight: t.total_weight,
                prev_weight: y.total_weight,
                weight_delta: t.total_weight - y.total_weight,
            }),
            (Some(t), None) => Some(DiffedHolding {
                security_id: id.clone(),
                security_name: t.security_name.clone(),
                status: DiffStatus::New,
                today_weight: t.total_weight,
                prev_weight: 0.0,
                weight_delta: t.total_weight,
            }),
            (None, Some(y)) => Some(DiffedHolding {
                security_id: id.clone(),
                security_name: y.security_name.clone(),
                status: DiffStatus::Out,
                today_weight: 0.0,
                prev_weight: y.total_weight,
                weight_delta: -y.total_weight,
            }),
            (None, None) => None,
        })
        .collect();

    rows.sort_by(by_delta_desc);
    rows
}

pub(crate) fn by_delta_desc(a: &DiffedHolding, b: &DiffedHolding) -> Ordering {
    b.weight_delta
        .total_cmp(&a.weight_delta)
        .then_with(|| a.security_id.cmp(&b.security_id))
}
