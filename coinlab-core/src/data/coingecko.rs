//! CoinGecko v3 data provider.
//!
//! Historical series come from `/coins/{id}/market_chart` (daily interval),
//! current snapshots from `/coins/markets`. Handles retries with exponential
//! backoff, payload parsing, and the circuit breaker.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, MarketDataProvider};
use crate::domain::{MarketChart, MarketSnapshot};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Free-tier history ceiling, in days.
pub const MAX_FREE_TIER_DAYS: u32 = 365;

/// One entry of the `/coins/markets` array.
#[derive(Debug, Deserialize)]
struct MarketEntry {
    current_price: Option<f64>,
    total_volume: Option<f64>,
    market_cap: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    high_24h: Option<f64>,
    low_24h: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

pub struct CoinGeckoProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl CoinGeckoProvider {
    pub fn new(config: CoinGeckoConfig, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("coinlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            circuit_breaker,
            max_retries: config.max_retries,
            base_delay: config.base_delay,
        })
    }

    /// Clamp a requested history depth to the free-tier ceiling.
    pub fn clamp_days(days: u32) -> u32 {
        if days > MAX_FREE_TIER_DAYS {
            warn!(
                requested = days,
                ceiling = MAX_FREE_TIER_DAYS,
                "history depth clamped to free-tier ceiling"
            );
        }
        days.clamp(1, MAX_FREE_TIER_DAYS)
    }

    pub fn market_chart_url(&self, asset_id: &str, vs_currency: &str, days: u32) -> String {
        format!(
            "{}/coins/{asset_id}/market_chart?vs_currency={vs_currency}&days={days}&interval=daily",
            self.base_url
        )
    }

    pub fn markets_url(&self, asset_id: &str, vs_currency: &str) -> String {
        format!(
            "{}/coins/markets?vs_currency={vs_currency}&ids={asset_id}&order=market_cap_desc&sparkline=false",
            self.base_url
        )
    }

    /// Parse a `market_chart` body. All three series must be present.
    pub fn parse_market_chart(asset_id: &str, body: &str) -> Result<MarketChart, DataError> {
        serde_json::from_str(body).map_err(|e| {
            DataError::MalformedPayload(format!("market_chart for '{asset_id}': {e}"))
        })
    }

    /// Parse a `/coins/markets` body into a snapshot stamped `captured_at`.
    pub fn parse_snapshot(
        asset_id: &str,
        body: &str,
        captured_at: DateTime<Utc>,
    ) -> Result<MarketSnapshot, DataError> {
        let entries: Vec<MarketEntry> = serde_json::from_str(body).map_err(|e| {
            DataError::MalformedPayload(format!("markets for '{asset_id}': {e}"))
        })?;
        let entry = entries.into_iter().next().ok_or_else(|| DataError::AssetNotFound {
            asset_id: asset_id.to_string(),
        })?;

        Ok(MarketSnapshot {
            captured_at,
            asset_id: asset_id.to_string(),
            price: entry.current_price,
            volume: entry.total_volume,
            market_cap: entry.market_cap,
            price_change_24h: entry.price_change_percentage_24h,
            high_24h: entry.high_24h,
            low_24h: entry.low_24h,
        })
    }

    /// GET `url` with retry and circuit-breaker handling, returning the body.
    fn get_with_retry(&self, url: &str, asset_id: &str) -> Result<String, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(asset_id, attempt, ?delay, "retrying request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::AssetNotFound {
                    asset_id: asset_id.to_string(),
                });
            }

            if status.is_server_error() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::HttpStatus {
                    status: status.as_u16(),
                    asset_id: asset_id.to_string(),
                });
                continue;
            }

            if !status.is_success() {
                return Err(DataError::HttpStatus {
                    status: status.as_u16(),
                    asset_id: asset_id.to_string(),
                });
            }

            let body = resp
                .text()
                .map_err(|e| DataError::MalformedPayload(format!("reading body for '{asset_id}': {e}")))?;
            self.circuit_breaker.record_success();
            return Ok(body);
        }

        Err(last_error.unwrap_or_else(|| DataError::NetworkUnreachable("max retries exceeded".into())))
    }

}

impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn source(&self) -> DataSource {
        DataSource::CoinGecko
    }

    fn market_chart(
        &self,
        asset_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart, DataError> {
        let url = self.market_chart_url(asset_id, vs_currency, Self::clamp_days(days));
        let body = self.get_with_retry(&url, asset_id)?;
        Self::parse_market_chart(asset_id, &body)
    }

    fn snapshot(&self, asset_id: &str, vs_currency: &str) -> Result<MarketSnapshot, DataError> {
        let url = self.markets_url(asset_id, vs_currency);
        let body = self.get_with_retry(&url, asset_id)?;
        Self::parse_snapshot(asset_id, &body, Utc::now())
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> CoinGeckoProvider {
        CoinGeckoProvider::new(
            CoinGeckoConfig {
                base_url: base_url.into(),
                ..CoinGeckoConfig::default()
            },
            Arc::new(CircuitBreaker::default_provider()),
        )
        .unwrap()
    }

    #[test]
    fn urls_carry_query_parameters() {
        let p = provider("https://example.test/api/v3/");
        assert_eq!(
            p.market_chart_url("bitcoin", "usd", 30),
            "https://example.test/api/v3/coins/bitcoin/market_chart?vs_currency=usd&days=30&interval=daily"
        );
        assert!(p
            .markets_url("ethereum", "eur")
            .ends_with("/coins/markets?vs_currency=eur&ids=ethereum&order=market_cap_desc&sparkline=false"));
    }

    #[test]
    fn days_are_clamped_to_free_tier() {
        assert_eq!(CoinGeckoProvider::clamp_days(30), 30);
        assert_eq!(CoinGeckoProvider::clamp_days(5000), MAX_FREE_TIER_DAYS);
        assert_eq!(CoinGeckoProvider::clamp_days(0), 1);
    }

    #[test]
    fn parses_market_chart() {
        let body = r#"{"prices":[[1,2.0]],"market_caps":[[1,3.0]],"total_volumes":[[1,4.0]]}"#;
        let chart = CoinGeckoProvider::parse_market_chart("bitcoin", body).unwrap();
        assert_eq!(chart.prices[0].value, 2.0);
        assert_eq!(chart.market_caps[0].value, 3.0);
        assert_eq!(chart.total_volumes[0].value, 4.0);
    }

    #[test]
    fn partial_chart_is_malformed() {
        let body = r#"{"prices":[[1,2.0]]}"#;
        let err = CoinGeckoProvider::parse_market_chart("bitcoin", body).unwrap_err();
        assert!(matches!(err, DataError::MalformedPayload(_)));
    }

    #[test]
    fn parses_snapshot() {
        let body = r#"[{"id":"bitcoin","current_price":43000.5,"total_volume":1.2e10,
            "market_cap":8.4e11,"price_change_percentage_24h":-1.25,
            "high_24h":44000.0,"low_24h":42500.0}]"#;
        let now = Utc::now();
        let snap = CoinGeckoProvider::parse_snapshot("bitcoin", body, now).unwrap();
        assert_eq!(snap.asset_id, "bitcoin");
        assert_eq!(snap.price, Some(43000.5));
        assert_eq!(snap.price_change_24h, Some(-1.25));
        assert_eq!(snap.low_24h, Some(42500.0));
        assert_eq!(snap.captured_at, now);
    }

    #[test]
    fn empty_markets_array_is_not_found() {
        let err = CoinGeckoProvider::parse_snapshot("nope", "[]", Utc::now()).unwrap_err();
        assert!(matches!(err, DataError::AssetNotFound { .. }));
    }

    #[test]
    fn snapshot_tolerates_null_fields() {
        let body = r#"[{"current_price":1.0,"total_volume":null,"market_cap":null,
            "price_change_percentage_24h":null,"high_24h":null,"low_24h":null}]"#;
        let snap = CoinGeckoProvider::parse_snapshot("x", body, Utc::now()).unwrap();
        assert_eq!(snap.volume, None);
        assert_eq!(snap.high_24h, None);
    }

    #[test]
    fn tripped_breaker_refuses_without_network() {
        let breaker = Arc::new(CircuitBreaker::default_provider());
        breaker.trip();
        let p = CoinGeckoProvider::new(CoinGeckoConfig::default(), breaker).unwrap();
        assert!(!p.is_available());
        let err = p.market_chart("bitcoin", "usd", 30).unwrap_err();
        assert!(matches!(err, DataError::CircuitBreakerTripped));
    }
}
