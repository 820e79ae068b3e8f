pub mod aggregator;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod refresher;
pub mod report;
pub mod types;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber for a binary, filtered at `log_level`.
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();
}
