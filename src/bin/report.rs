//! One-shot entry point: writes an initial report (workbook under `output/`
//! unless `WORKBOOK_PATH` is set), then keeps tracking on the normal cadence.

use tracing::{error, info, warn};

use crypto_tracker::config::Config;
use crypto_tracker::error::Result;
use crypto_tracker::fetcher::CoinGeckoClient;
use crypto_tracker::init_tracing;
use crypto_tracker::refresher::Tracker;
use crypto_tracker::report::Renderer;
use crypto_tracker::types::CycleOutcome;

#[tokio::main]
async fn main() {
    let cfg = match Config::one_shot_from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&cfg.log_level);

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    for dir in cfg.output_dirs() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let client = CoinGeckoClient::new(&cfg)?;
    let renderer = Renderer::new(&cfg);
    let mut tracker = Tracker::new(cfg, client, renderer);

    let stop = tracker.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current cycle");
            stop.stop();
        }
    });

    info!("Generating initial analysis report...");
    let initial = tracker.tick().await;
    match &initial.outcome {
        Some(CycleOutcome::Updated { coins }) => info!("Initial report written ({coins} coins)"),
        Some(CycleOutcome::Skipped { reason }) => {
            warn!("Initial report not written, no market data ({reason})")
        }
        None => warn!("Initial report failed; retrying on the backoff schedule"),
    }

    info!("Starting live tracking...");
    tracker.run_after(initial.wait).await;
    Ok(())
}
