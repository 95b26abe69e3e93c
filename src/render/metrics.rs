//! Metric bar charts.
//!
//! Two views over the same rows: Counts (share of total claim count) and
//! Amounts (share of total absolute paid amount).  Bars carry percentages,
//! not pixel widths — the shell scales them to whatever space it has.

use crate::model::MetricRow;
use crate::render::Tone;

/// Shown in both chart panels when there are no metric rows.
pub const EMPTY_CHART_MESSAGE: &str = "No data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartView {
    Counts,
    Amounts,
}

/// One proportional bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub category: String,
    pub tone: Tone,
    /// Share of the view's total, 0.0–100.0.  All-zero totals yield 0.0 for
    /// every bar rather than a division error.
    pub percent: f64,
    /// Count, or the abbreviated amount with currency code.
    pub value_label: String,
}

/// Build the bars for one view.  Empty input returns no bars; the shell
/// renders [`EMPTY_CHART_MESSAGE`] in that case.
pub fn chart(metrics: &[MetricRow], view: ChartView, currency: &str) -> Vec<ChartBar> {
    let total: f64 = match view {
        ChartView::Counts => metrics.iter().map(|m| m.count as f64).sum(),
        ChartView::Amounts => metrics.iter().map(|m| m.amount.abs()).sum(),
    };

    metrics
        .iter()
        .map(|m| {
            let share = match view {
                ChartView::Counts => m.count as f64,
                ChartView::Amounts => m.amount.abs(),
            };
            let percent = if total > 0.0 { share / total * 100.0 } else { 0.0 };
            let value_label = match view {
                ChartView::Counts => m.count.to_string(),
                ChartView::Amounts => format_amount(m.amount, currency),
            };
            ChartBar {
                category: m.category.clone(),
                tone: category_tone(&m.category),
                percent,
                value_label,
            }
        })
        .collect()
}

/// Category color mapping shared by both views.
pub fn category_tone(category: &str) -> Tone {
    match category {
        "No error" => Tone::Success,
        "Medical error" => Tone::Error,
        "Technical error" => Tone::Warning,
        _ => Tone::Info,
    }
}

/// Abbreviate an amount with its currency code: `AED 1.2M`, `AED 4.5k`,
/// `AED 12.34`, with a leading minus sign for negative amounts.
pub fn format_amount(amount: f64, currency: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    let value = if abs >= 1e6 {
        format!("{:.1}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}k", abs / 1e3)
    } else {
        format!("{abs:.2}")
    };
    format!("{sign}{currency} {value}")
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, count: u64, amount: f64) -> MetricRow {
        MetricRow {
            category: category.to_string(),
            count,
            amount,
        }
    }

    #[test]
    fn test_count_percentages_sum_to_100() {
        let metrics = vec![
            row("No error", 6, 100.0),
            row("Medical error", 3, 50.0),
            row("Technical error", 1, 25.0),
        ];
        let bars = chart(&metrics, ChartView::Counts, "AED");
        let total: f64 = bars.iter().map(|b| b.percent).sum();
        assert!((total - 100.0).abs() < 1e-9, "got {total}");
        assert_eq!(bars[0].percent, 60.0);
    }

    #[test]
    fn test_amount_percentages_use_absolute_values() {
        let metrics = vec![row("No error", 1, 75.0), row("Medical error", 1, -25.0)];
        let bars = chart(&metrics, ChartView::Amounts, "AED");
        assert_eq!(bars[0].percent, 75.0);
        assert_eq!(bars[1].percent, 25.0);
        let total: f64 = bars.iter().map(|b| b.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_metrics_render_zero_width_bars() {
        let metrics = vec![row("No error", 0, 0.0), row("Both", 0, 0.0)];
        for view in [ChartView::Counts, ChartView::Amounts] {
            let bars = chart(&metrics, view, "AED");
            assert_eq!(bars.len(), 2);
            assert!(bars.iter().all(|b| b.percent == 0.0));
        }
    }

    #[test]
    fn test_empty_metrics_produce_no_bars() {
        assert!(chart(&[], ChartView::Counts, "AED").is_empty());
        assert!(chart(&[], ChartView::Amounts, "AED").is_empty());
    }

    #[test]
    fn test_category_tones() {
        assert_eq!(category_tone("No error"), Tone::Success);
        assert_eq!(category_tone("Medical error"), Tone::Error);
        assert_eq!(category_tone("Technical error"), Tone::Warning);
        assert_eq!(category_tone("Both"), Tone::Info);
        assert_eq!(category_tone("anything else"), Tone::Info);
    }

    #[test]
    fn test_amount_abbreviation_boundaries() {
        assert_eq!(format_amount(999.99, "AED"), "AED 999.99");
        assert_eq!(format_amount(1_000.0, "AED"), "AED 1.0k");
        assert_eq!(format_amount(999_999.0, "AED"), "AED 1000.0k");
        assert_eq!(format_amount(1_000_000.0, "AED"), "AED 1.0M");
        assert_eq!(format_amount(1_250_000.0, "AED"), "AED 1.2M");
        assert_eq!(format_amount(12.3, "AED"), "AED 12.30");
    }

    #[test]
    fn test_negative_amounts_keep_sign_and_currency() {
        assert_eq!(format_amount(-1_200_000.0, "AED"), "-AED 1.2M");
        assert_eq!(format_amount(-42.5, "USD"), "-USD 42.50");
    }
}
