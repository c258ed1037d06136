//! Candle series shared by the detector and composer tests.

use chrono::{DateTime, TimeZone, Utc};

use common::Candle;

pub fn ts(i: usize) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + i as i64 * 300, 0).unwrap()
}

pub fn candle(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle {
        timestamp: ts(i),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// 20 flat candles (0.997..1.003) with falling volume, then a spring candle
/// that dips to 0.995 and closes at 1.002 on modest volume.
pub fn accumulation_spring() -> Vec<Candle> {
    let mut series: Vec<Candle> = (0..20)
        .map(|i| candle(i, 0.999, 1.003, 0.997, 1.000, 1000.0 - 10.0 * i as f64))
        .collect();
    series.push(candle(20, 0.996, 1.003, 0.995, 1.002, 500.0));
    series
}

/// 50 candles around 100 with a swing high at 40 (102), a swing low at 42
/// (98), a bearish order block at 36 and a bullish order block at 38.
/// The last candle is replaced by the caller.
pub fn structure_base() -> Vec<Candle> {
    let mut series: Vec<Candle> = (0..50)
        .map(|i| candle(i, 100.0, 100.5, 99.5, 100.0, 100.0))
        .collect();
    series[36] = candle(36, 100.2, 100.3, 99.8, 99.9, 100.0);
    series[38] = candle(38, 99.9, 100.3, 99.8, 100.2, 100.0);
    series[40] = candle(40, 100.0, 102.0, 99.5, 100.0, 100.0);
    series[42] = candle(42, 100.0, 100.5, 98.0, 100.0, 100.0);
    series
}

/// Outside bar through both swings closing back mid-range: bullish and
/// bearish each score 3 (break of structure, liquidity grab, order block).
pub fn structure_tie() -> Vec<Candle> {
    let mut series = structure_base();
    series[49] = candle(49, 100.0, 103.0, 97.0, 100.0, 100.0);
    series
}

/// Strong bearish candle breaking the swing low: bearish scores 3, bullish 1.
pub fn structure_bearish() -> Vec<Candle> {
    let mut series = structure_base();
    series[49] = candle(49, 100.4, 100.5, 97.0, 97.5, 100.0);
    series
}

/// Nine quiet candles followed by `last` (volume average 100, spread 1).
pub fn volume_series(last: Candle) -> Vec<Candle> {
    let mut series: Vec<Candle> = (0..9)
        .map(|i| candle(i, 100.0, 100.5, 99.5, 100.0, 100.0))
        .collect();
    series.push(Candle { timestamp: ts(9), ..last });
    series
}
