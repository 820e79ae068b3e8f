use crate::report::format::{pct, usd, usd_grouped};
use crate::types::AnalysisSummary;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const STATUS_LIVE: &str = "LIVE";

/// One label/value line of the spreadsheet's status block or Analysis sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub label: String,
    pub value: String,
}

impl MetricRow {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }

    fn blank() -> Self {
        Self::new("", "")
    }

    pub fn is_blank(&self) -> bool {
        self.label.is_empty() && self.value.is_empty()
    }
}

pub fn format_timestamp(summary: &AnalysisSummary) -> String {
    summary.timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Rows above the Live Data table. The first row's value is the status cell.
pub fn status_rows(summary: &AnalysisSummary, next_update: &str) -> Vec<MetricRow> {
    vec![
        MetricRow::new("Status", STATUS_LIVE),
        MetricRow::new("Last Updated", format_timestamp(summary)),
        MetricRow::new("Next Update In", next_update),
    ]
}

/// Key/value listing for the Analysis sheet (below its Metric/Value header).
pub fn analysis_rows(summary: &AnalysisSummary) -> Vec<MetricRow> {
    let mut rows = vec![
        MetricRow::new("Last Updated", format_timestamp(summary)),
        MetricRow::new("Average Price (USD)", usd(summary.mean_price)),
        MetricRow::new("Median Price (USD)", usd(summary.median_price)),
        MetricRow::new("Total Market Cap (USD)", usd_grouped(summary.total_market_cap)),
        MetricRow::new(
            "Highest 24h Change",
            format!("{} ({})", summary.highest_change.name, pct(summary.highest_change.change_24h_pct)),
        ),
        MetricRow::new(
            "Lowest 24h Change",
            format!("{} ({})", summary.lowest_change.name, pct(summary.lowest_change.change_24h_pct)),
        ),
        MetricRow::blank(),
        MetricRow::new(format!("Top {} by Market Cap:", summary.top_by_market_cap.len()), ""),
    ];

    for (i, coin) in summary.top_by_market_cap.iter().enumerate() {
        rows.push(MetricRow::new(
            format!("{}. {} ({})", i + 1, coin.name, coin.symbol.to_uppercase()),
            format!("Market Cap: {}", usd_grouped(coin.market_cap)),
        ));
    }

    rows.push(MetricRow::blank());
    rows.push(MetricRow::new("Most Volatile Coins (24h):", ""));

    for (i, coin) in summary.most_volatile.iter().enumerate() {
        rows.push(MetricRow::new(
            format!("{}. {}", i + 1, coin.name),
            pct(coin.change_24h_pct),
        ));
    }

    rows
}
