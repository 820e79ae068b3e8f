use std::fmt;

use crate::config::volatility_thresholds;
use crate::report::format::{pct, truncate, usd, usd_grouped};
use crate::report::model::format_timestamp;
use crate::types::AnalysisSummary;

pub const DATA_SOURCE: &str = "CoinGecko API";

/// Narrative plain-text report for one cycle.
pub struct TextReport<'a> {
    pub summary: &'a AnalysisSummary,
    /// e.g. "5 minutes"
    pub update_label: &'a str,
}

pub fn render(summary: &AnalysisSummary, update_label: &str) -> String {
    TextReport { summary, update_label }.to_string()
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.summary;

        writeln!(f, "Cryptocurrency Market Analysis Report")?;
        writeln!(f, "Generated on: {}", format_timestamp(s))?;
        writeln!(f)?;
        writeln!(f, "Executive Summary")?;
        writeln!(f, "-----------------")?;
        writeln!(
            f,
            "This report provides an analysis of the top {} cryptocurrencies by market capitalization.",
            s.coin_count
        )?;
        writeln!(f)?;

        writeln!(f, "Key Metrics")?;
        writeln!(f, "-----------")?;
        writeln!(f, "1. Market Overview")?;
        writeln!(f, "   - Total Number of Cryptocurrencies Analyzed: {}", s.coin_count)?;
        writeln!(f, "   - Total Market Capitalization: {}", usd_grouped(s.total_market_cap))?;
        writeln!(f, "   - Average Price: {}", usd(s.mean_price))?;
        writeln!(f, "   - Median Price: {}", usd(s.median_price))?;
        writeln!(f)?;

        writeln!(f, "2. Top {} Cryptocurrencies by Market Cap", s.top_by_market_cap.len())?;
        writeln!(
            f,
            "   {:>2}  {:<22} {:<8} {:>24} {:>16}",
            "#", "Name", "Symbol", "Market Cap (USD)", "Price (USD)"
        )?;
        for (i, coin) in s.top_by_market_cap.iter().enumerate() {
            writeln!(
                f,
                "   {:>2}  {:<22} {:<8} {:>24} {:>16}",
                i + 1,
                truncate(&coin.name, 22),
                truncate(&coin.symbol.to_uppercase(), 8),
                usd_grouped(coin.market_cap),
                usd(coin.price),
            )?;
        }
        writeln!(f)?;

        writeln!(f, "3. Price Changes (24h)")?;
        writeln!(
            f,
            "   - Highest Gain: {} ({})",
            s.highest_change.name,
            pct(s.highest_change.change_24h_pct)
        )?;
        writeln!(
            f,
            "   - Biggest Drop: {} ({})",
            s.lowest_change.name,
            pct(s.lowest_change.change_24h_pct)
        )?;
        writeln!(f)?;

        writeln!(f, "4. Trading Volume")?;
        writeln!(f, "   - Total 24h Volume: {}", usd_grouped(s.total_volume))?;
        writeln!(f, "   - Average Volume per Cryptocurrency: {}", usd_grouped(s.mean_volume))?;
        writeln!(f)?;

        writeln!(f, "Market Insights")?;
        writeln!(f, "---------------")?;
        writeln!(f, "1. Market Concentration")?;
        writeln!(
            f,
            "   - Top {} cryptocurrencies represent {:.2}% of total market cap",
            s.top_by_market_cap.len(),
            s.concentration_pct
        )?;
        writeln!(f)?;
        writeln!(f, "2. Volatility Analysis")?;
        writeln!(
            f,
            "   - Number of cryptocurrencies with >{:.0}% price change: {}",
            volatility_thresholds::HIGH,
            s.moves_over_high
        )?;
        writeln!(
            f,
            "   - Number of cryptocurrencies with >{:.0}% price change: {}",
            volatility_thresholds::EXTREME,
            s.moves_over_extreme
        )?;
        writeln!(f)?;

        writeln!(f, "Data Source: {DATA_SOURCE}")?;
        writeln!(f, "Update Frequency: Every {}", self.update_label)
    }
}
