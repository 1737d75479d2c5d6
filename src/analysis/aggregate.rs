//! Per-security aggregation across the selected funds.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::domain::{AggregatedHolding, HoldingRecord};

/// Aggregation output: one row per security id, plus the rejected input count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub holdings: BTreeMap<String, AggregatedHolding>,
    /// Records rejected for a non-finite weight.
    pub skipped: usize,
}

/// Neumaier-compensated running sum.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(self) -> f64 {
        self.sum + self.compensation
    }
}

#[derive(Debug)]
struct Accumulator<'a> {
    name: &'a str,
    total: CompensatedSum,
    funds: BTreeSet<&'a str>,
}

/// Group records by security id.
///
/// - total weight sums every record, including duplicate (fund, security) rows
/// - fund count is the number of *distinct* fund ids
/// - the display name is the first one seen in input order
pub fn aggregate(records: &[HoldingRecord]) -> Aggregation {
    let mut groups: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        if !record.weight.is_finite() {
            warn!(
                fund = %record.fund_id,
                security = %record.security_id,
                weight = record.weight,
                "skipping record with non-finite weight"
            );
            skipped += 1;
            continue;
        }

        let acc = groups.entry(record.security_id.as_str()).or_insert_with(|| Accumulator {
            name: record.security_name.as_str(),
            total: CompensatedSum::default(),
            funds: BTreeSet::new(),
        });
        acc.total.add(record.weight);
        acc.funds.insert(record.fund_id.as_str());
    }

    let holdings = groups
        .into_iter()
        .filter_map(|(security_id, acc)| {
            let fund_count = acc.funds.len();
            let total_weight = acc.total.value();
            let avg_weight = average_weight(total_weight, fund_count)?;
            Some((
                security_id.to_string(),
                AggregatedHolding {
                    security_id: security_id.to_string(),
                    security_name: acc.name.to_string(),
                    total_weight,
                    avg_weight,
                    fund_count,
                },
            ))
        })
        .collect();

    Aggregation { holdings, skipped }
}

/// `total / fund_count`; `None` for a zero count (such a row is never materialized).
pub fn average_weight(total_weight: f64, fund_count: usize) -> Option<f64> {
    if fund_count == 0 {
        return None;
    }
    Some(total_weight / fund_count as f64)
}
