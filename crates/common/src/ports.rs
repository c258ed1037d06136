use async_trait::async_trait;
use tracing::error;

use crate::{CandleSeries, Error, Result, Signal};

/// Source of candle history.
///
/// `BinanceFeed` in `crates/engine` implements this against the public REST API.
/// Implementations must return candles time-ascending, newest last.
#[async_trait]
pub trait CandleFeed: Send + Sync {
    /// Fetch the latest `limit` candles of `interval` for `symbol`.
    async fn candles(&self, symbol: &str, interval: &str, limit: u32) -> Result<CandleSeries>;
}

/// Destination for human-readable alerts.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Deliver one message. Any failure is reported as `Error::Dispatch`.
    async fn send(&self, text: &str) -> Result<()>;
}

/// Append-only collection of dispatched signals.
///
/// The orchestrator is the only writer; readers (status endpoint) only call `load`.
#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn append(&self, signal: &Signal) -> Result<()>;

    /// Every stored signal in insertion order.
    /// An unreadable store yields `Error::StoreCorruption`.
    async fn load(&self) -> Result<Vec<Signal>>;

    /// `load`, treating an unreadable store as empty.
    ///
    /// Falling back to empty can hide historical data loss, so the
    /// corruption is always logged at error level.
    async fn load_or_empty(&self) -> Vec<Signal> {
        match self.load().await {
            Ok(signals) => signals,
            Err(Error::StoreCorruption(reason)) => {
                error!(%reason, "Signal store unreadable, continuing with an empty collection");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Failed to load signal store");
                Vec::new()
            }
        }
    }
}
