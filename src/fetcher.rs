use async_trait::async_trait;
use tracing::{debug, info};

use crate::aggregator::normalize;
use crate::config::{Config, USER_AGENT};
use crate::error::{AppError, Result};
use crate::types::MarketSnapshot;

/// Longest slice of an error body carried into `AppError::Status`.
const ERROR_BODY_MAX: usize = 200;

/// Where the refresh loop gets its snapshots from.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// One request, no retries. Transport and shape problems come back as
    /// errors for which `AppError::is_fetch_failure` holds.
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot>;
}

/// Client for the CoinGecko `/coins/markets` endpoint.
pub struct CoinGeckoClient {
    client: reqwest::Client,
    markets_url: String,
    page_size: usize,
}

impl CoinGeckoClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            markets_url: cfg.markets_url(),
            page_size: cfg.page_size,
        })
    }

    /// Fetch the first page of markets as raw JSON objects.
    pub async fn fetch_raw(&self) -> Result<Vec<serde_json::Value>> {
        let resp = self.client.get(&self.markets_url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let body = if body.len() > ERROR_BODY_MAX {
                let mut end = ERROR_BODY_MAX;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}…", &body[..end])
            } else {
                body
            };
            return Err(AppError::Status { status: status.as_u16(), body });
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        match value {
            serde_json::Value::Array(items) => {
                debug!(items = items.len(), "Fetched /coins/markets page");
                Ok(items)
            }
            other => Err(AppError::DataShape(format!(
                "/coins/markets response was not an array (got {})",
                json_kind(&other)
            ))),
        }
    }
}

#[async_trait]
impl MarketSource for CoinGeckoClient {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot> {
        let raw = self.fetch_raw().await?;
        let snapshot = normalize(&raw, self.page_size);
        info!(
            received = raw.len(),
            coins = snapshot.len(),
            "Fetched market snapshot: {} of {} records usable",
            snapshot.len(),
            raw.len(),
        );
        Ok(snapshot)
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
