use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Market records
// ---------------------------------------------------------------------------

/// One tracked asset as seen in a single poll. All numeric fields are finite.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRecord {
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Current price (USD).
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    /// 24h price change in percent (e.g. -12.5 means -12.5%).
    pub change_24h_pct: f64,
}

/// Records from one successful fetch, ordered by descending market cap,
/// with unique identifiers. Built once per cycle and never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    records: Vec<MarketRecord>,
}

impl MarketSnapshot {
    /// Enforces the snapshot invariants: finite values, first occurrence of
    /// each identifier, descending market cap (stable), at most `max_records`.
    pub fn from_records(records: Vec<MarketRecord>, max_records: usize) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut records: Vec<MarketRecord> = records
            .into_iter()
            .filter(|r| {
                r.price.is_finite()
                    && r.market_cap.is_finite()
                    && r.volume_24h.is_finite()
                    && r.change_24h_pct.is_finite()
            })
            .filter(|r| seen.insert(r.id.clone()))
            .collect();
        records.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap));
        records.truncate(max_records);
        Self { records }
    }

    pub fn records(&self) -> &[MarketRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Facts derived from exactly one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSummary {
    pub timestamp: NaiveDateTime,
    pub coin_count: usize,
    pub top_by_market_cap: Vec<MarketRecord>,
    pub mean_price: f64,
    pub median_price: f64,
    pub total_market_cap: f64,
    pub highest_change: MarketRecord,
    pub lowest_change: MarketRecord,
    /// Top records by |24h change|, largest first.
    pub most_volatile: Vec<MarketRecord>,
    pub total_volume: f64,
    pub mean_volume: f64,
    /// Share of total market cap held by `top_by_market_cap`, in percent.
    pub concentration_pct: f64,
    pub moves_over_high: usize,
    pub moves_over_extreme: usize,
}

// ---------------------------------------------------------------------------
// Refresh loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Normal cadence.
    Running,
    /// Cooling down after a failed cycle.
    Backoff,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::Running => write!(f, "running"),
            LoopState::Backoff => write!(f, "backoff"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Both output files were replaced.
    Updated { coins: usize },
    /// No data this cycle; nothing was written.
    Skipped { reason: String },
}
