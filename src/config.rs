use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Quote currency for every price, cap and volume figure.
pub const VS_CURRENCY: &str = "usd";

/// Records requested per poll (first page only).
pub const PAGE_SIZE: usize = 50;

/// Normal cadence between successful cycles (seconds).
pub const UPDATE_INTERVAL_SECS: u64 = 300;

/// Cooldown after a cycle-ending failure (seconds).
pub const BACKOFF_SECS: u64 = 60;

/// Hard timeout on the market data request (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub const USER_AGENT: &str = concat!("crypto-tracker/", env!("CARGO_PKG_VERSION"));

/// Size of the "top by market cap" list and of the concentration ratio's numerator.
pub const TOP_MARKET_CAP_COUNT: usize = 5;

/// Size of the "most volatile" list.
pub const TOP_VOLATILE_COUNT: usize = 3;

/// Absolute 24h change thresholds (percent) counted in the text report.
pub mod volatility_thresholds {
    pub const HIGH: f64 = 5.0;
    pub const EXTREME: f64 = 10.0;
}

pub const DEFAULT_WORKBOOK_PATH: &str = "crypto_tracker.xlsx";
pub const DEFAULT_REPORT_PATH: &str = "report.txt";

/// Directory used by the one-shot `report` entry point.
pub const OUTPUT_DIR: &str = "output";
pub const OUTPUT_WORKBOOK_NAME: &str = "crypto_live_data.xlsx";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub page_size: usize,
    pub workbook_path: PathBuf,
    /// Plain-text report, fully overwritten each cycle.
    pub report_path: PathBuf,
    pub update_interval: Duration,
    pub backoff: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: COINGECKO_API_URL.to_string(),
            page_size: PAGE_SIZE,
            workbook_path: PathBuf::from(DEFAULT_WORKBOOK_PATH),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            update_interval: Duration::from_secs(UPDATE_INTERVAL_SECS),
            backoff: Duration::from_secs(BACKOFF_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            api_url: std::env::var("COINGECKO_API_URL")
                .unwrap_or_else(|_| COINGECKO_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            page_size: defaults.page_size,
            workbook_path: std::env::var("WORKBOOK_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.workbook_path),
            report_path: std::env::var("REPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_path),
            update_interval: parse_secs(
                "UPDATE_INTERVAL_SECS",
                std::env::var("UPDATE_INTERVAL_SECS").ok(),
                UPDATE_INTERVAL_SECS,
            )?,
            backoff: parse_secs("BACKOFF_SECS", std::env::var("BACKOFF_SECS").ok(), BACKOFF_SECS)?,
            request_timeout: parse_secs(
                "REQUEST_TIMEOUT_SECS",
                std::env::var("REQUEST_TIMEOUT_SECS").ok(),
                REQUEST_TIMEOUT_SECS,
            )?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Config for the one-shot entry point: the workbook moves to
    /// `output/crypto_live_data.xlsx` unless `WORKBOOK_PATH` names it.
    pub fn one_shot_from_env() -> Result<Self> {
        let explicit_workbook = std::env::var_os("WORKBOOK_PATH").is_some();
        Ok(Self::from_env()?.into_one_shot(explicit_workbook))
    }

    pub fn into_one_shot(self, explicit_workbook: bool) -> Self {
        if explicit_workbook {
            self
        } else {
            self.with_output_dir(Path::new(OUTPUT_DIR))
        }
    }

    /// Directories that must exist before outputs can be written.
    pub fn output_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = [&self.workbook_path, &self.report_path]
            .into_iter()
            .filter_map(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        dirs.dedup();
        dirs
    }

    /// Place the workbook inside `dir` under its one-shot name.
    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        self.workbook_path = dir.join(OUTPUT_WORKBOOK_NAME);
        self
    }

    pub fn markets_url(&self) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page=1&sparkline=false",
            self.api_url, VS_CURRENCY, self.page_size
        )
    }
}

fn parse_secs(name: &str, raw: Option<String>, default: u64) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::Config(format!("{name} must be greater than zero"))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(AppError::Config(format!("{name} must be a whole number of seconds"))),
    }
}

/// Human label for an update interval: 300s → "5 minutes", 90s → "90 seconds".
pub fn interval_label(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{s} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_behaviour() {
        let cfg = Config::default();
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.update_interval, Duration::from_secs(300));
        assert_eq!(cfg.backoff, Duration::from_secs(60));
        assert_eq!(cfg.workbook_path, PathBuf::from("crypto_tracker.xlsx"));
        assert_eq!(cfg.report_path, PathBuf::from("report.txt"));
    }

    #[test]
    fn markets_url_carries_fixed_query() {
        let cfg = Config { api_url: "http://localhost:9999".to_string(), ..Config::default() };
        assert_eq!(
            cfg.markets_url(),
            "http://localhost:9999/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=50&page=1&sparkline=false"
        );
    }

    #[test]
    fn output_dir_relocates_workbook_only() {
        let cfg = Config::default().with_output_dir(Path::new(OUTPUT_DIR));
        assert_eq!(cfg.workbook_path, PathBuf::from("output/crypto_live_data.xlsx"));
        assert_eq!(cfg.report_path, PathBuf::from("report.txt"));
    }

    #[test]
    fn one_shot_keeps_explicit_workbook_path() {
        let explicit = Config {
            workbook_path: PathBuf::from("exports/live.xlsx"),
            ..Config::default()
        };
        assert_eq!(
            explicit.clone().into_one_shot(true).workbook_path,
            PathBuf::from("exports/live.xlsx")
        );
        assert_eq!(
            explicit.into_one_shot(false).workbook_path,
            PathBuf::from("output/crypto_live_data.xlsx")
        );
    }

    #[test]
    fn output_dirs_follow_the_configured_paths() {
        assert!(Config::default().output_dirs().is_empty());

        let cfg = Config::default().into_one_shot(false);
        assert_eq!(cfg.output_dirs(), vec![Path::new("output")]);

        let cfg = Config {
            workbook_path: PathBuf::from("exports/live.xlsx"),
            report_path: PathBuf::from("reports/report.txt"),
            ..Config::default()
        };
        assert_eq!(cfg.output_dirs(), vec![Path::new("exports"), Path::new("reports")]);
    }

    #[test]
    fn parse_secs_rejects_zero_and_garbage() {
        assert_eq!(parse_secs("X", None, 300).unwrap(), Duration::from_secs(300));
        assert_eq!(parse_secs("X", Some(" 120 ".to_string()), 300).unwrap(), Duration::from_secs(120));
        assert!(matches!(parse_secs("X", Some("0".to_string()), 300), Err(AppError::Config(_))));
        assert!(matches!(parse_secs("X", Some("5m".to_string()), 300), Err(AppError::Config(_))));
    }

    #[test]
    fn interval_labels() {
        assert_eq!(interval_label(Duration::from_secs(300)), "5 minutes");
        assert_eq!(interval_label(Duration::from_secs(60)), "1 minute");
        assert_eq!(interval_label(Duration::from_secs(90)), "90 seconds");
    }
}
