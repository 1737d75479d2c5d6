//! Fund universe filtering.

use crate::domain::{FundPerformance, SelectionCriteria};

/// Narrow the universe to the funds whose holdings will be aggregated.
///
/// Order of operations: name filter, drop non-finite returns, sort by return
/// (desc, ties by ticker), minimum-return threshold, then `top_n`.
pub fn select_funds(universe: &[FundPerformance], criteria: &SelectionCriteria) -> Vec<FundPerformance> {
    let mut funds: Vec<FundPerformance> = universe
        .iter()
        .filter(|f| criteria.name_filter.is_empty() || f.name.contains(criteria.name_filter.as_str()))
        .filter(|f| f.trailing_return.is_finite())
        .cloned()
        .collect();

    funds.sort_by(|a, b| {
        b.trailing_return
            .total_cmp(&a.trailing_return)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    if let Some(min) = criteria.min_return {
        funds.retain(|f| f.trailing_return >= min);
    }
    if criteria.top_n > 0 {
        funds.truncate(criteria.top_n);
    }
    funds
}
