//! Recommended gas price.
//!
//! Prices are expressed in Gwei as `f64`. Feed-backed prices are cached for
//! [`GAS_PRICE_TTL`](super::constants::GAS_PRICE_TTL).

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{sync::Mutex, time::Instant};

use super::{chain::GasPriceStrategy, constants::GAS_PRICE_TTL};
use crate::error::{AppError, Result};

/// External source of a gas price in Gwei.
#[async_trait]
pub trait GasPriceFeed: Send + Sync {
    async fn fetch_gwei(&self) -> Result<f64>;
}

/// Gas station response. Prices are in tenths of Gwei.
#[derive(Debug, Deserialize)]
struct GasStationResponse {
    fast: f64,
}

/// ethgasstation-style JSON feed.
#[derive(Debug, Clone)]
pub struct GasStationFeed {
    url: String,
    http: reqwest::Client,
}

impl GasStationFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), http: reqwest::Client::new() }
    }
}

#[async_trait]
impl GasPriceFeed for GasStationFeed {
    async fn fetch_gwei(&self) -> Result<f64> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::GasOracle(format!("{}: {}", self.url, e)))?;

        let prices: GasStationResponse = response
            .json()
            .await
            .map_err(|e| AppError::GasOracle(format!("invalid feed response: {}", e)))?;

        Ok(prices.fast / 10.0)
    }
}

#[derive(Clone)]
enum GasPriceSource {
    Fixed(f64),
    Feed(Arc<dyn GasPriceFeed>),
    Node,
}

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    gwei: f64,
    fetched_at: Instant,
}

/// Gas price oracle for one chain.
#[derive(Clone)]
pub struct GasPriceOracle {
    source: GasPriceSource,
    ttl: Duration,
    cache: Arc<Mutex<Option<CachedPrice>>>,
}

impl GasPriceOracle {
    /// Oracle returning a constant price.
    pub fn fixed(gwei: f64) -> Self {
        Self::with_source(GasPriceSource::Fixed(gwei))
    }

    /// Oracle backed by an external feed, cached for the default TTL.
    pub fn feed(feed: Arc<dyn GasPriceFeed>) -> Self {
        Self::with_source(GasPriceSource::Feed(feed))
    }

    /// Oracle deferring to the nodes' `eth_gasPrice`.
    pub fn node() -> Self {
        Self::with_source(GasPriceSource::Node)
    }

    pub fn from_strategy(strategy: &GasPriceStrategy) -> Self {
        match strategy {
            GasPriceStrategy::Fixed(gwei) => Self::fixed(*gwei),
            GasPriceStrategy::Feed { url } => Self::feed(Arc::new(GasStationFeed::new(url))),
            GasPriceStrategy::Node => Self::node(),
        }
    }

    fn with_source(source: GasPriceSource) -> Self {
        Self { source, ttl: GAS_PRICE_TTL, cache: Arc::new(Mutex::new(None)) }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// True when the price must be read from the nodes by the caller.
    pub fn uses_nodes(&self) -> bool {
        matches!(self.source, GasPriceSource::Node)
    }

    /// Recommended price in Gwei for fixed and feed sources.
    ///
    /// The cache lock is released while the feed is queried, so concurrent
    /// misses may each fetch once.
    pub async fn recommended(&self) -> Result<f64> {
        let feed = match &self.source {
            GasPriceSource::Fixed(gwei) => return Ok(*gwei),
            GasPriceSource::Node => {
                return Err(AppError::GasOracle(
                    "node strategy is resolved through the node set".to_string(),
                ))
            }
            GasPriceSource::Feed(feed) => feed,
        };

        if let Some(cached) = *self.cache.lock().await {
            if cached.fetched_at.elapsed() <= self.ttl {
                return Ok(cached.gwei);
            }
        }

        let gwei = feed.fetch_gwei().await?;
        tracing::debug!(gwei = gwei, "Gas price refreshed from feed");

        *self.cache.lock().await = Some(CachedPrice { gwei, fetched_at: Instant::now() });
        Ok(gwei)
    }
}

impl std::fmt::Debug for GasPriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            GasPriceSource::Fixed(gwei) => format!("fixed({})", gwei),
            GasPriceSource::Feed(_) => "feed".to_string(),
            GasPriceSource::Node => "node".to_string(),
        };
        f.debug_struct("GasPriceOracle").field("source", &source).field("ttl", &self.ttl).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFeed {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingFeed {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), fail })
        }
    }

    #[async_trait]
    impl GasPriceFeed for CountingFeed {
        async fn fetch_gwei(&self) -> Result<f64> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(AppError::GasOracle("feed down".into()));
            }
            Ok(20.0 + n as f64)
        }
    }

    #[tokio::test]
    async fn test_fixed_price() {
        let oracle = GasPriceOracle::fixed(5.0);
        assert_eq!(oracle.recommended().await.unwrap(), 5.0);
        assert!(!oracle.uses_nodes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_is_cached_within_ttl() {
        let feed = CountingFeed::new(false);
        let oracle = GasPriceOracle::feed(feed.clone());

        assert_eq!(oracle.recommended().await.unwrap(), 21.0);
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(oracle.recommended().await.unwrap(), 21.0);
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_refreshes_after_ttl() {
        let feed = CountingFeed::new(false);
        let oracle = GasPriceOracle::feed(feed.clone());

        oracle.recommended().await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(oracle.recommended().await.unwrap(), 22.0);
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_feed_failure_is_not_cached() {
        let feed = CountingFeed::new(true);
        let oracle = GasPriceOracle::feed(feed.clone());

        assert!(matches!(oracle.recommended().await, Err(AppError::GasOracle(_))));
        assert!(oracle.recommended().await.is_err());
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_node_strategy_defers_to_caller() {
        let oracle = GasPriceOracle::from_strategy(&GasPriceStrategy::Node);
        assert!(oracle.uses_nodes());
        assert!(oracle.recommended().await.is_err());
    }

    #[test]
    fn test_gas_station_response_parsing() {
        let body = r#"{"fast": 450.0, "fastest": 600.0, "safeLow": 300.0, "average": 350.0}"#;
        let parsed: GasStationResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.fast / 10.0, 45.0);
    }
}
