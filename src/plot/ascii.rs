//! ASCII bar charts for terminal output.
//!
//! This is intentionally "dumb" (fixed-width bars), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Bar elements:
//! - positive values: `#`
//! - negative values: `=`

use crate::domain::{AggregatedHolding, FundSummary};

const MAX_LABEL: usize = 20;

/// Bars for the largest aggregated holdings (total weight, percent).
pub fn render_holdings_chart(rows: &[&AggregatedHolding], width: usize) -> String {
    let bars: Vec<(String, f64)> = rows
        .iter()
        .map(|h| (h.security_name.clone(), h.total_weight))
        .collect();
    render_bar_chart(&bars, width)
}

/// Bars for the selected funds' trailing returns (percent).
pub fn render_returns_chart(funds: &[FundSummary], width: usize) -> String {
    let bars: Vec<(String, f64)> = funds.iter().map(|f| (f.name.clone(), f.trailing_return)).collect();
    render_bar_chart(&bars, width)
}

/// Render labelled horizontal bars scaled to the largest absolute value.
pub fn render_bar_chart(bars: &[(String, f64)], width: usize) -> String {
    let width = width.max(10);
    let bars: Vec<&(String, f64)> = bars.iter().filter(|(_, v)| v.is_finite()).collect();

    let max_abs = bars.iter().map(|(_, v)| v.abs()).fold(0.0_f64, f64::max);
    let label_width = bars
        .iter()
        .map(|(label, _)| label.chars().count().min(MAX_LABEL))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("Bars: n={} | max={max_abs:.2}\n", bars.len()));

    for (label, value) in bars {
        let len = bar_len(*value, max_abs, width);
        let ch = if *value < 0.0 { "=" } else { "#" };
        let bar = ch.repeat(len);
        out.push_str(
            format!(
                "{:<label_width$} |{bar:<width$}| {value:.2}",
                crate::report::truncate(label, MAX_LABEL),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn bar_len(value: f64, max_abs: f64, width: usize) -> usize {
    if max_abs <= 0.0 {
        return 0;
    }
    let u = (value.abs() / max_abs).clamp(0.0, 1.0);
    (u * width as f64).round() as usize
}
