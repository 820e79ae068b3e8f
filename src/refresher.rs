use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::aggregator::analyze;
use crate::config::{interval_label, Config};
use crate::error::Result;
use crate::fetcher::MarketSource;
use crate::report::Renderer;
use crate::types::{CycleOutcome, LoopState};

/// Source of the timestamp stamped on each summary.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// The loop's only suspension point besides the network call.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Asks a running [`Tracker`] to stop at its next sleep boundary.
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// What one [`Tracker::tick`] did and how long to wait before the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub wait: Duration,
    /// `None` when the cycle failed and the tracker entered Backoff.
    pub outcome: Option<CycleOutcome>,
}

/// Fetch → analyze → render on a fixed cadence, backing off after failures.
pub struct Tracker<S> {
    cfg: Config,
    source: S,
    renderer: Renderer,
    clock: Box<dyn Clock>,
    sleeper: Box<dyn Sleeper>,
    state: LoopState,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl<S: MarketSource> Tracker<S> {
    pub fn new(cfg: Config, source: S, renderer: Renderer) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            cfg,
            source,
            renderer,
            clock: Box::new(LocalClock),
            sleeper: Box::new(TokioSleeper),
            state: LoopState::Running,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { tx: Arc::clone(&self.stop_tx) }
    }

    fn stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Run cycles until stopped, starting immediately.
    pub async fn run(self) {
        self.run_after(Duration::ZERO).await;
    }

    /// Wait `first_wait`, then run cycles until stopped.
    pub async fn run_after(mut self, first_wait: Duration) {
        info!(
            "Starting crypto tracker: updating every {}, backoff {}",
            interval_label(self.cfg.update_interval),
            interval_label(self.cfg.backoff),
        );

        let mut wait = first_wait;
        loop {
            if !wait.is_zero() && self.wait_or_stop(wait).await {
                break;
            }
            if self.stop_requested() {
                break;
            }
            wait = self.tick().await.wait;
        }

        info!("Crypto tracker stopped");
    }

    /// Sleep for `duration` unless a stop arrives first. Returns true when stopped.
    async fn wait_or_stop(&self, duration: Duration) -> bool {
        if self.stop_requested() {
            return true;
        }
        let mut stop_rx = self.stop_rx.clone();
        tokio::select! {
            _ = self.sleeper.sleep(duration) => self.stop_requested(),
            _ = stop_rx.changed() => true,
        }
    }

    /// One state-machine step.
    ///
    /// Entering a tick in Backoff means the cooldown has been served, so the
    /// state returns to Running before the cycle is retried.
    pub async fn tick(&mut self) -> Tick {
        if self.state == LoopState::Backoff {
            info!("Backoff elapsed, retrying cycle");
            self.state = LoopState::Running;
        }

        info!("Fetching data at {}", self.clock.now().format("%Y-%m-%d %H:%M:%S"));

        match self.run_cycle().await {
            Ok(outcome) => {
                match &outcome {
                    CycleOutcome::Updated { coins } => info!(
                        coins = *coins,
                        workbook = %self.renderer.workbook_path().display(),
                        report = %self.renderer.report_path().display(),
                        "Outputs updated; next update in {}",
                        interval_label(self.cfg.update_interval),
                    ),
                    CycleOutcome::Skipped { reason } => warn!(
                        "No data this cycle ({reason}); next attempt in {}",
                        interval_label(self.cfg.update_interval),
                    ),
                }
                Tick { wait: self.cfg.update_interval, outcome: Some(outcome) }
            }
            Err(e) => {
                error!(
                    state = %LoopState::Backoff,
                    "Cycle skipped: {e}. Retrying in {}",
                    interval_label(self.cfg.backoff),
                );
                self.state = LoopState::Backoff;
                Tick { wait: self.cfg.backoff, outcome: None }
            }
        }
    }

    /// Fetch failures are absorbed here as `Skipped`; anything else propagates.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let snapshot = match self.source.fetch_snapshot().await {
            Ok(s) => s,
            Err(e) if e.is_fetch_failure() => {
                return Ok(CycleOutcome::Skipped { reason: e.to_string() });
            }
            Err(e) => return Err(e),
        };

        let summary = analyze(&snapshot, self.clock.now())?;
        self.renderer.render(&snapshot, &summary)?;

        info!(
            coins = summary.coin_count,
            total_market_cap = summary.total_market_cap,
            mean_price = summary.mean_price,
            top_gainer = %summary.highest_change.name,
            top_loser = %summary.lowest_change.name,
            "Snapshot analyzed",
        );

        Ok(CycleOutcome::Updated { coins: summary.coin_count })
    }
}
