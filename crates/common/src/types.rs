use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One OHLCV candle. `timestamp` is the candle open time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// High-to-low range of the candle.
    pub fn spread(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute open-to-close distance.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Time-ascending candles, newest last. Replaced wholesale every cycle.
pub type CandleSeries = Vec<Candle>;

/// The three polled intervals of the watched market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Short,
    Mid,
    Long,
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Short => write!(f, "short"),
            Timeframe::Mid => write!(f, "mid"),
            Timeframe::Long => write!(f, "long"),
        }
    }
}

/// A consolidation range found over the zone detector's window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub range_high: f64,
    pub range_low: f64,
}

/// Direction of a detected setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Bullish => write!(f, "bullish"),
            SignalType::Bearish => write!(f, "bearish"),
            SignalType::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for SignalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bullish" => Ok(SignalType::Bullish),
            "bearish" => Ok(SignalType::Bearish),
            "neutral" => Ok(SignalType::Neutral),
            other => Err(Error::InvalidSignal(format!("unknown signal type '{other}'"))),
        }
    }
}

/// A trade setup ready for scoring and dispatch.
///
/// Field names on the wire match the persisted signal file read by the
/// feedback tooling (`signal_id`, `type`, `sl`, `tp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    /// Short-timeframe candle time, minute resolution.
    #[serde(with = "minute_time")]
    pub time: DateTime<Utc>,
    #[serde(rename = "signal_id")]
    pub id: String,
    pub entry: f64,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    #[serde(rename = "sl")]
    pub stop_loss: Option<f64>,
    #[serde(rename = "tp")]
    pub take_profit: Option<f64>,
    pub tp_hit: bool,
    pub sl_hit: bool,
    pub reasoning: String,
    pub description: String,
}

impl Signal {
    /// Levels are ordered the way the direction requires.
    /// Neutral signals must carry no levels.
    pub fn levels_consistent(&self) -> bool {
        match (self.signal_type, self.stop_loss, self.take_profit) {
            (SignalType::Bullish, Some(sl), Some(tp)) => sl < self.entry && self.entry < tp,
            (SignalType::Bearish, Some(sl), Some(tp)) => tp < self.entry && self.entry < sl,
            (SignalType::Neutral, None, None) => true,
            _ => false,
        }
    }
}

/// Unrounded, unvalidated signal fields. `build` turns it into a `Signal`.
#[derive(Debug, Clone)]
pub struct SignalDraft {
    pub symbol: String,
    pub time: DateTime<Utc>,
    pub id: String,
    pub signal_type: SignalType,
    pub entry: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub reasoning: String,
    pub description: String,
}

impl SignalDraft {
    /// Round prices to 4 decimals and check the level ordering.
    pub fn build(self) -> Result<Signal> {
        let signal = Signal {
            symbol: self.symbol,
            time: self.time,
            id: self.id,
            entry: round_price(self.entry),
            signal_type: self.signal_type,
            stop_loss: self.stop_loss.map(round_price),
            take_profit: self.take_profit.map(round_price),
            tp_hit: false,
            sl_hit: false,
            reasoning: self.reasoning,
            description: self.description,
        };

        if !signal.levels_consistent() {
            return Err(Error::InvalidSignal(format!(
                "{} signal {} has entry {} stop {:?} target {:?}",
                signal.signal_type, signal.id, signal.entry, signal.stop_loss, signal.take_profit
            )));
        }
        Ok(signal)
    }
}

/// Round a price to 4 decimals.
pub fn round_price(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Canonical text form of a candle timestamp used inside signal ids.
pub fn timestamp_id(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `%Y-%m-%d %H:%M` (de)serialization for signal times.
pub mod minute_time {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M";

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&text, FORMAT).map_err(serde::de::Error::custom)?;
        Ok(Utc.from_utc_datetime(&naive))
    }
}
