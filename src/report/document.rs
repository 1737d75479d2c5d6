//! Paged Markdown report.
//!
//! Layout (pages separated by `PAGE_BREAK`):
//! 1. fund overview, consensus top N, weight change top N
//! 2. new entries and exits
//! 3. returns chart

use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{exits, new_entries, top_holdings, top_increases};
use crate::app::pipeline::RunOutput;
use crate::domain::{DiffedHolding, compact};
use crate::error::{AppError, EXIT_USAGE};
use crate::report::format::fmt_signed;

/// Explicit page break understood by Markdown-to-PDF converters.
pub const PAGE_BREAK: &str = "<div style=\"page-break-after: always;\"></div>";

pub fn report_file_name(output: &RunOutput) -> String {
    format!("report_{}.md", compact(output.date))
}

pub fn chart_file_name(output: &RunOutput) -> String {
    format!("chart_{}.svg", compact(output.date))
}

/// Render the report. `chart` is the chart file name relative to the report, if one was drawn.
pub fn render_markdown(output: &RunOutput, top_n: usize, chart: Option<&str>) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Active ETF Analysis Report - {}\n\n", compact(output.date)));
    out.push_str(&format!(
        "Funds analysed: {} | securities: {} | prior snapshot: {}\n\n",
        output.stats.funds_with_holdings,
        output.snapshot.len(),
        match &output.previous {
            Some(_) => output.prev_date.to_string(),
            None => "none".to_string(),
        }
    ));
    if !output.failures.is_empty() {
        out.push_str(&format!(
            "> Holdings could not be fetched for {} fund(s); figures below are incomplete.\n\n",
            output.failures.len()
        ));
    }

    // 1) Fund overview.
    out.push_str("## 1. Analysis Target ETF Overview\n\n");
    if output.summaries.is_empty() {
        out.push_str("_No funds matched the selection criteria._\n\n");
    } else {
        out.push_str("| Ticker | Name | Close | Day Chg(%) | Return(%) |\n");
        out.push_str("|---|---|---:|---:|---:|\n");
        for f in &output.summaries {
            out.push_str(&format!(
                "| {} | {} | {:.0} | {} | {} |\n",
                f.ticker,
                escape_cell(&f.name),
                f.close,
                fmt_signed(f.change_pct),
                fmt_signed(f.trailing_return),
            ));
        }
        out.push('\n');
    }

    // 2) Consensus top N.
    out.push_str(&format!("## 2. Consensus Holdings Top {top_n}\n\n"));
    let top = top_holdings(&output.snapshot.holdings, top_n);
    if top.is_empty() {
        out.push_str("_No holdings._\n\n");
    } else {
        out.push_str("| Rank | Stock Name | Total Weight | Avg Weight | ETF Count |\n");
        out.push_str("|---:|---|---:|---:|---:|\n");
        for (i, h) in top.iter().enumerate() {
            out.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {} |\n",
                i + 1,
                escape_cell(&h.security_name),
                h.total_weight,
                h.avg_weight,
                h.fund_count,
            ));
        }
        out.push('\n');
    }

    // 3) Weight change top N.
    out.push_str(&format!("## 3. Weight Change Top {top_n}\n\n"));
    push_diff_table(&mut out, &top_increases(&output.diff, top_n), "_No weight increases._");

    out.push_str(PAGE_BREAK);
    out.push_str("\n\n");

    if output.previous.is_some() {
        out.push_str("### New Entries\n\n");
        push_diff_table(&mut out, &new_entries(&output.diff), "_None._");
        out.push_str("### Exits\n\n");
        push_diff_table(&mut out, &exits(&output.diff), "_None._");
    } else {
        out.push_str("_First run: no prior snapshot to compare against._\n\n");
    }

    out.push_str(PAGE_BREAK);
    out.push_str("\n\n");

    // 4) Chart.
    out.push_str("## 4. ETF Returns Comparison\n\n");
    match chart {
        Some(file) => out.push_str(&format!("![ETF trailing returns]({file})\n")),
        None => out.push_str("_Chart not rendered._\n"),
    }

    out
}

/// Write the report into `dir`, returning the file path.
pub fn write_report(dir: &Path, output: &RunOutput, top_n: usize, chart: Option<&str>) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create report dir '{}': {e}", dir.display())))?;
    let path = dir.join(report_file_name(output));
    fs::write(&path, render_markdown(output, top_n, chart))
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write report '{}': {e}", path.display())))?;
    Ok(path)
}

fn push_diff_table(out: &mut String, rows: &[&DiffedHolding], empty: &str) {
    if rows.is_empty() {
        out.push_str(empty);
        out.push_str("\n\n");
        return;
    }
    out.push_str("| Stock Name | Current | Previous | Change |\n");
    out.push_str("|---|---:|---:|---:|\n");
    for d in rows {
        out.push_str(&format!(
            "| {} | {:.2} | {:.2} | {} |\n",
            escape_cell(&d.security_name),
            d.today_weight,
            d.prev_weight,
            fmt_signed(d.weight_delta),
        ));
    }
    out.push('\n');
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use tempfile::tempdir;

    use crate::analysis::diff_snapshots;
    use crate::app::pipeline::RunStats;
    use crate::domain::{AggregatedHolding, DailySnapshot, FundSummary};

    fn holding(id: &str, name: &str, total: f64) -> (String, AggregatedHolding) {
        (
            id.to_string(),
            AggregatedHolding {
                security_id: id.to_string(),
                security_name: name.to_string(),
                total_weight: total,
                avg_weight: total,
                fund_count: 1,
            },
        )
    }

    fn output(with_prior: bool) -> RunOutput {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let prev_date = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        let today: BTreeMap<_, _> = [holding("A", "Alpha|Pref", 5.0), holding("B", "Beta", 3.0)].into();
        let prior: BTreeMap<_, _> = [holding("A", "Alpha|Pref", 4.0), holding("C", "Gamma", 2.0)].into();
        let previous = with_prior.then(|| DailySnapshot::new(prev_date, prior));
        let diff = diff_snapshots(&today, previous.as_ref().map(|p| &p.holdings));
        RunOutput {
            date,
            prev_date,
            funds: Vec::new(),
            summaries: vec![FundSummary {
                ticker: "441800".to_string(),
                name: "TIMEFOLIO 액티브".to_string(),
                close: 12_345.0,
                nav: 12_340.0,
                volume: 100.0,
                trading_value: 1_234_500.0,
                change_pct: 1.5,
                trailing_return: 22.25,
            }],
            snapshot: DailySnapshot::new(date, today),
            previous,
            diff,
            failures: Vec::new(),
            stats: RunStats {
                funds_with_holdings: 1,
                ..RunStats::default()
            },
        }
    }

    #[test]
    fn renders_all_sections_with_page_breaks() {
        let md = render_markdown(&output(true), 10, Some("chart_20250106.svg"));

        assert!(md.starts_with("# Active ETF Analysis Report - 20250106\n"));
        assert_eq!(md.matches(PAGE_BREAK).count(), 2);
        assert!(md.contains("| 441800 | TIMEFOLIO 액티브 | 12345 | +1.50 | +22.25 |"));
        assert!(md.contains("| 1 | Alpha\\|Pref | 5.00 | 5.00 | 1 |"));
        assert!(md.contains("| Beta | 3.00 | 0.00 | +3.00 |"));
        assert!(md.contains("### Exits"));
        assert!(md.contains("| Gamma | 0.00 | 2.00 | -2.00 |"));
        assert!(md.contains("![ETF trailing returns](chart_20250106.svg)"));
    }

    #[test]
    fn first_run_has_no_entry_exit_tables() {
        let md = render_markdown(&output(false), 10, None);
        assert!(md.contains("First run"));
        assert!(!md.contains("### Exits"));
        assert!(md.contains("_Chart not rendered._"));
    }

    #[test]
    fn writes_named_file() {
        let dir = tempdir().unwrap();
        let out = output(true);
        let path = write_report(dir.path(), &out, 5, None).unwrap();
        assert_eq!(path, dir.path().join("report_20250106.md"));
        assert!(fs::read_to_string(path).unwrap().contains("Top 5"));
    }
}
