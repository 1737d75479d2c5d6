//! Formatted terminal output: run summary, fund overview and ranked tables.
//!
//! We keep formatting code in one place so:
//! - the aggregation/diff code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::analysis::{exits, new_entries, top_holdings, top_increases};
use crate::app::pipeline::RunOutput;
use crate::domain::{AggregatedHolding, DiffedHolding, FundSummary, RunConfig};

/// Format the full run summary (selection + counters + failures).
pub fn format_run_summary(output: &RunOutput, config: &RunConfig) -> String {
    let mut out = String::new();
    let s = &output.stats;
    let sel = &config.selection;

    out.push_str("=== etfc - ETF Consensus Holdings ===\n");
    out.push_str(&format!("Date: {} (prior: {})\n", output.date, output.prev_date));
    out.push_str(&format!(
        "Selection: name~'{}' | lookback={}d | top_n={} | min_return={}\n",
        sel.name_filter,
        sel.lookback_days,
        if sel.top_n == 0 { "all".to_string() } else { sel.top_n.to_string() },
        sel.min_return.map(|m| format!("{m:.2}%")).unwrap_or_else(|| "-".to_string()),
    ));
    out.push_str(&format!(
        "Funds: universe={} | selected={} | with holdings={} | no data={} | failed={}\n",
        s.funds_in_universe, s.funds_selected, s.funds_with_holdings, s.funds_without_data, s.funds_failed
    ));
    out.push_str(&format!(
        "Rows: read={} | used={} | skipped={} | securities={}\n",
        s.rows_read,
        s.records_used,
        s.rows_skipped,
        output.snapshot.len()
    ));
    match &output.previous {
        Some(prev) => out.push_str(&format!("Prior snapshot: {} securities\n", prev.len())),
        None => out.push_str("Prior snapshot: none (first run)\n"),
    }

    if !output.failures.is_empty() {
        out.push_str("\nFailed funds (snapshot will not be stored):\n");
        for f in &output.failures {
            out.push_str(&format!("- {} {}: {}\n", f.ticker, truncate(&f.name, 32), f.error));
        }
    }
    out.push('\n');

    out
}

/// Format the ranked sections: top holdings, top increases, new entries, exits.
pub fn format_rankings(output: &RunOutput, top_n: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!("Consensus top {top_n} (total weight):\n"));
    out.push_str(&format_holdings_table(&top_holdings(&output.snapshot.holdings, top_n)));
    out.push('\n');

    out.push_str(&format!("Weight increase top {top_n}:\n"));
    out.push_str(&format_diff_table(&top_increases(&output.diff, top_n)));
    out.push('\n');

    if output.previous.is_some() {
        let new = new_entries(&output.diff);
        out.push_str(&format!("New entries ({}):\n", new.len()));
        out.push_str(&format_diff_table(&new));
        out.push('\n');

        let out_rows = exits(&output.diff);
        out.push_str(&format!("Exits ({}):\n", out_rows.len()));
        out.push_str(&format_diff_table(&out_rows));
    }

    out
}

/// Format the selected funds with price and return columns.
pub fn format_fund_table(rows: &[FundSummary]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<8} {:<28} {:>12} {:>10} {:>12}\n",
            "ticker", "name", "close", "day_chg%", "return%"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<28} {:-<12} {:-<10} {:-<12}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<8} {:<28} {:>12.0} {:>10} {:>12}\n",
                r.ticker,
                truncate(&r.name, 28),
                r.close,
                fmt_signed(r.change_pct),
                fmt_signed(r.trailing_return),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

pub fn format_holdings_table(rows: &[&AggregatedHolding]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>4} {:<12} {:<24} {:>10} {:>10} {:>6}\n",
            "rank", "id", "name", "total%", "avg%", "funds"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<12} {:-<24} {:-<10} {:-<10} {:-<6}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for (i, h) in rows.iter().enumerate() {
        out.push_str(
            format!(
                "{:>4} {:<12} {:<24} {:>10.2} {:>10.2} {:>6}\n",
                i + 1,
                truncate(&h.security_id, 12),
                truncate(&h.security_name, 24),
                h.total_weight,
                h.avg_weight,
                h.fund_count,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

pub fn format_diff_table(rows: &[&DiffedHolding]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:<24} {:<8} {:>10} {:>10} {:>10}\n",
            "id", "name", "status", "today%", "prev%", "delta"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<24} {:-<8} {:-<10} {:-<10} {:-<10}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for d in rows {
        out.push_str(
            format!(
                "{:<12} {:<24} {:<8} {:>10.2} {:>10.2} {:>10}\n",
                truncate(&d.security_id, 12),
                truncate(&d.security_name, 24),
                d.status.label(),
                d.today_weight,
                d.prev_weight,
                fmt_signed(d.weight_delta),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// `+1.23` / `-1.23`.
pub fn fmt_signed(v: f64) -> String {
    format!("{v:+.2}")
}

/// Shorten `s` to at most `max` characters, marking the cut with `.`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
