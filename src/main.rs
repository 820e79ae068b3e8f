use tracing::{error, info};

use crypto_tracker::config::Config;
use crypto_tracker::error::Result;
use crypto_tracker::fetcher::CoinGeckoClient;
use crypto_tracker::init_tracing;
use crypto_tracker::refresher::Tracker;
use crypto_tracker::report::Renderer;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
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
    let client = CoinGeckoClient::new(&cfg)?;
    let renderer = Renderer::new(&cfg);
    info!(
        workbook = %cfg.workbook_path.display(),
        report = %cfg.report_path.display(),
        "Writing outputs",
    );

    let tracker = Tracker::new(cfg, client, renderer);

    // Ctrl-C stops the loop at its next sleep boundary.
    let stop = tracker.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current cycle");
            stop.stop();
        }
    });

    tracker.run().await;
    Ok(())
}
