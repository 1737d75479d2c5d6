//! Plotters-powered returns chart, rendered to SVG for the report.
//!
//! One horizontal bar per selected fund, sorted so the best performer ends up
//! on top. Gains are drawn red and losses blue (KRX convention).

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use plotters::prelude::*;

use crate::domain::FundSummary;
use crate::error::{AppError, EXIT_USAGE};

const WIDTH: u32 = 960;
const ROW_HEIGHT: u32 = 28;
const GAIN: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const LOSS: RGBColor = RGBColor(0x34, 0x98, 0xdb);

/// Render the trailing-return bar chart for `funds` to `path`.
pub fn write_returns_chart(path: &Path, funds: &[FundSummary], date: NaiveDate) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create '{}': {e}", parent.display())))?;
    }
    draw_returns_chart(path, funds, date)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to render chart '{}': {e}", path.display())))
}

fn draw_returns_chart(path: &Path, funds: &[FundSummary], date: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let mut rows: Vec<&FundSummary> = funds.iter().filter(|f| f.trailing_return.is_finite()).collect();
    rows.sort_by(|a, b| a.trailing_return.total_cmp(&b.trailing_return));

    let n = rows.len().max(1);
    let height = 140 + ROW_HEIGHT * n as u32;
    let (x0, x1) = return_bounds(rows.iter().map(|f| f.trailing_return));

    let root = SVGBackend::new(path, (WIDTH, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("ETF trailing returns ({date})"), ("sans-serif", 20))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 260)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, (0..n as i32).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("return (%)")
        .y_labels(n)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => rows.get(*i as usize).map(|f| f.name.clone()).unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(rows.iter().enumerate().map(|(i, f)| {
        let color = if f.trailing_return >= 0.0 { GAIN } else { LOSS };
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(i as i32)),
                (f.trailing_return, SegmentValue::Exact(i as i32 + 1)),
            ],
            color.filled(),
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;

    root.present()?;
    Ok(())
}

/// X range covering zero and every value, padded by 10% of the span.
fn return_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = (max - min).max(1.0);
    let pad = span * 0.1;
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn summary(name: &str, ret: f64) -> FundSummary {
        FundSummary {
            ticker: "000000".to_string(),
            name: name.to_string(),
            close: 10_000.0,
            nav: 10_000.0,
            volume: 0.0,
            trading_value: 0.0,
            change_pct: 0.0,
            trailing_return: ret,
        }
    }

    #[test]
    fn bounds_include_zero() {
        assert_eq!(return_bounds([5.0, 15.0].into_iter()), (-1.5, 16.5));
        let (lo, hi) = return_bounds([-10.0].into_iter());
        assert!(lo < -10.0 && hi > 0.0);
        assert_eq!(return_bounds(std::iter::empty()), (-0.1, 0.1));
    }

    #[test]
    fn writes_svg_with_fund_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("chart_20250103.svg");
        let funds = vec![summary("Alpha Active", 12.5), summary("Beta Active", -3.0)];
        let date = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();

        write_returns_chart(&path, &funds, date).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Alpha Active"));
        assert!(svg.contains("Beta Active"));
    }
}
