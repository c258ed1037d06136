use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use common::{Candle, CandleFeed, CandleSeries, Error, Result};

/// Public market-data client for the Binance REST API. No credentials needed.
pub struct BinanceFeed {
    base_url: String,
    http: Client,
}

impl BinanceFeed {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl CandleFeed for BinanceFeed {
    async fn candles(&self, symbol: &str, interval: &str, limit: u32) -> Result<CandleSeries> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", interval.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Fetch(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {status}: {body}")));
        }

        let series = parse_klines(&body)?;
        debug!(symbol, interval, candles = series.len(), "Klines fetched");
        Ok(series)
    }
}

/// Parse a klines response body.
///
/// Each row is `[open_time_ms, open, high, low, close, volume, ...]` where the
/// numeric fields may be strings or numbers. Malformed rows are skipped.
pub fn parse_klines(body: &str) -> Result<CandleSeries> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(body).map_err(|e| Error::Fetch(format!("Bad klines payload: {e}")))?;

    let mut series: CandleSeries = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let candle = parse_row(row);
            if candle.is_none() {
                debug!(row = i, "Skipping malformed kline row");
            }
            candle
        })
        .collect();
    series.sort_by_key(|c| c.timestamp);
    Ok(series)
}

fn parse_row(row: &[Value]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }
    let open_ms = number(&row[0])? as i64;
    Some(Candle {
        timestamp: DateTime::<Utc>::from_timestamp_millis(open_ms)?,
        open: number(&row[1])?,
        high: number(&row[2])?,
        low: number(&row[3])?,
        close: number(&row[4])?,
        volume: number(&row[5])?,
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
