//! Normalization of raw provider holdings.
//!
//! This module is responsible for turning the string-typed constituent rows a
//! provider returns into clean `HoldingRecord`s that are safe to aggregate.
//!
//! Design goals:
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (input order is preserved)
//! - **Separation of concerns**: no aggregation logic here

use crate::domain::{HoldingRecord, RawHolding};

/// A row-level error encountered while normalizing one fund's holdings.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub fund_id: String,
    /// 1-based position in the provider response.
    pub row: usize,
    pub security_id: Option<String>,
    pub message: String,
}

/// Normalization output for one fund.
#[derive(Debug, Clone, Default)]
pub struct NormalizedHoldings {
    pub records: Vec<HoldingRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Weights were derived from valuation amounts because none were published.
    pub derived_weights: bool,
}

/// Normalize one fund's raw holdings.
pub fn normalize_holdings(fund_id: &str, raw: &[RawHolding]) -> NormalizedHoldings {
    let mut out = NormalizedHoldings {
        rows_read: raw.len(),
        ..Default::default()
    };

    let any_weight = raw.iter().any(|r| r.weight.is_some());
    let derived = if any_weight { None } else { derive_weights(raw) };
    out.derived_weights = derived.is_some();

    for (idx, row) in raw.iter().enumerate() {
        let row_no = idx + 1;
        let security_id = row.security_id.trim();
        if security_id.is_empty() {
            out.row_errors.push(RowError {
                fund_id: fund_id.to_string(),
                row: row_no,
                security_id: None,
                message: "Missing security id.".to_string(),
            });
            continue;
        }

        let weight = match &derived {
            Some(weights) => weights[idx].ok_or_else(|| "Missing/invalid valuation amount.".to_string()),
            None => parse_weight(row.weight.as_deref()),
        };

        match weight {
            Ok(weight) => {
                let name = row.security_name.trim();
                let name = if name.is_empty() { security_id } else { name };
                out.records.push(HoldingRecord {
                    fund_id: fund_id.to_string(),
                    security_id: security_id.to_string(),
                    security_name: name.to_string(),
                    weight,
                });
            }
            Err(message) => out.row_errors.push(RowError {
                fund_id: fund_id.to_string(),
                row: row_no,
                security_id: Some(security_id.to_string()),
                message,
            }),
        }
    }

    out
}

/// Parse a provider number: trims, strips thousands separators, rejects `-`/empty/non-finite.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|&c| c != ',').collect();
    let v = cleaned.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_weight(raw: Option<&str>) -> Result<f64, String> {
    let raw = raw.ok_or_else(|| "Missing weight.".to_string())?;
    parse_number(raw).ok_or_else(|| format!("Invalid weight '{raw}'."))
}

/// Weights as each row's share of the summed valuation amount, in percent.
///
/// Returns `None` when no positive amount is available.
fn derive_weights(raw: &[RawHolding]) -> Option<Vec<Option<f64>>> {
    let amounts: Vec<Option<f64>> = raw
        .iter()
        .map(|r| r.value_amount.as_deref().and_then(parse_number))
        .collect();
    let total: f64 = amounts.iter().flatten().filter(|a| **a > 0.0).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    Some(amounts.into_iter().map(|a| a.map(|a| a / total * 100.0)).collect())
}
