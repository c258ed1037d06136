//! Market-structure ("smart money") analysis over a lookback window.
//!
//! Five boolean observations are scored per direction: break of structure,
//! change of character, liquidity grab, strong directional candle and order
//! block presence. A direction scoring at least `min_score` (default 3/5)
//! produces a `StructureSignal`; bullish is checked first, so a tie where
//! both sides qualify resolves bullish.

use common::{Candle, SignalType};

use crate::config::StructureConfig;

/// Candles compared on each side of a swing candidate.
const SWING_SIDE: usize = 2;
/// Candles after an order-block candidate searched for the impulse.
const IMPULSE_CANDLES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct StructureSignal {
    pub signal_type: SignalType,
    pub score: u8,
    pub active_signals: Vec<&'static str>,
    /// Order-block indices into the analysed series, most recent first.
    pub order_blocks: Vec<usize>,
    pub reason: String,
    pub description: String,
}

/// Raw observations for one direction.
#[derive(Debug, Clone, Default)]
pub struct SideReading {
    pub bos: bool,
    pub choch: bool,
    pub liquidity_grab: bool,
    pub strong_candle: bool,
    pub order_blocks: Vec<usize>,
}

impl SideReading {
    pub fn score(&self) -> u8 {
        [
            self.bos,
            self.choch,
            self.liquidity_grab,
            self.strong_candle,
            !self.order_blocks.is_empty(),
        ]
        .iter()
        .filter(|&&hit| hit)
        .count() as u8
    }

    fn active(&self, strong_label: &'static str) -> Vec<&'static str> {
        [
            ("BOS", self.bos),
            ("CHoCH", self.choch),
            ("Liquidity Grab", self.liquidity_grab),
            (strong_label, self.strong_candle),
            ("Order Block", !self.order_blocks.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, hit)| hit.then_some(name))
        .collect()
    }
}

/// Both directions' observations for the latest candle.
#[derive(Debug, Clone, Default)]
pub struct StructureReading {
    pub swing_high: Option<usize>,
    pub swing_low: Option<usize>,
    pub bullish: SideReading,
    pub bearish: SideReading,
}

#[derive(Debug, Clone)]
pub struct MarketStructureAnalyzer {
    cfg: StructureConfig,
}

impl MarketStructureAnalyzer {
    pub fn new(cfg: StructureConfig) -> Self {
        Self { cfg }
    }

    /// Score both directions and emit the qualifying one, bullish first.
    pub fn analyze(&self, series: &[Candle]) -> Option<StructureSignal> {
        let reading = self.read(series)?;
        let min_score = self.cfg.min_score;

        if reading.bullish.score() >= min_score {
            Some(build_signal(SignalType::Bullish, &reading.bullish))
        } else if reading.bearish.score() >= min_score {
            Some(build_signal(SignalType::Bearish, &reading.bearish))
        } else {
            None
        }
    }

    /// Compute every observation without applying the score threshold.
    /// Returns `None` with fewer than `lookback` candles.
    pub fn read(&self, series: &[Candle]) -> Option<StructureReading> {
        let lookback = self.cfg.lookback;
        let n = series.len();
        if n < lookback || n < 2 {
            return None;
        }

        let last = &series[n - 1];
        let prev = &series[n - 2];

        let swing_high = swing_high(series, lookback);
        let swing_low = swing_low(series, lookback);
        let swing_high_price = swing_high.map(|i| series[i].high);
        let swing_low_price = swing_low.map(|i| series[i].low);

        let (window_low, window_high) = liquidity_extremes(series, self.cfg.liquidity_window);
        let spread = last.spread();
        let strong = self.cfg.strong_body_ratio * spread;

        let bullish = SideReading {
            bos: swing_high_price.is_some_and(|h| last.high > h),
            choch: swing_low_price.is_some_and(|l| prev.close < l && last.close > prev.high),
            liquidity_grab: window_low.is_some_and(|l| last.low < l && last.close > prev.low),
            strong_candle: last.is_bullish() && last.close - last.open > strong,
            order_blocks: order_blocks(series, lookback, self.cfg.min_impulse, SignalType::Bullish),
        };
        let bearish = SideReading {
            bos: swing_low_price.is_some_and(|l| last.low < l),
            choch: swing_high_price.is_some_and(|h| prev.close > h && last.close < prev.low),
            liquidity_grab: window_high.is_some_and(|h| last.high > h && last.close < prev.high),
            strong_candle: last.is_bearish() && last.open - last.close > strong,
            order_blocks: order_blocks(series, lookback, self.cfg.min_impulse, SignalType::Bearish),
        };

        Some(StructureReading {
            swing_high,
            swing_low,
            bullish,
            bearish,
        })
    }
}

fn build_signal(signal_type: SignalType, side: &SideReading) -> StructureSignal {
    let (label, strong_label) = match signal_type {
        SignalType::Bearish => ("Bearish", "Strong Bear Candle"),
        _ => ("Bullish", "Strong Bull Candle"),
    };
    let score = side.score();
    let active_signals = side.active(strong_label);

    StructureSignal {
        signal_type,
        score,
        reason: format!("{label} Score {score}/5 - Signals: {}", active_signals.join(", ")),
        description: format!("{label} OBs detected at: {:?}", side.order_blocks),
        active_signals,
        order_blocks: side.order_blocks.clone(),
    }
}

/// Candidate indices for swing points, most recent first: from the
/// second-to-last candle back to `n - lookback + 1`, keeping only those with
/// two full candles on each side.
fn swing_candidates(n: usize, lookback: usize) -> impl Iterator<Item = usize> {
    let lower = (n + 1).saturating_sub(lookback).max(SWING_SIDE);
    let upper = n.saturating_sub(SWING_SIDE + 1);
    (lower..=upper).rev().filter(move |&i| i >= SWING_SIDE && i + SWING_SIDE < n)
}

/// Most recent candle whose high exceeds the two highs on each side.
pub fn swing_high(series: &[Candle], lookback: usize) -> Option<usize> {
    swing_candidates(series.len(), lookback).find(|&i| {
        let neighbours = series[i - SWING_SIDE..=i + SWING_SIDE]
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != SWING_SIDE)
            .map(|(_, c)| c.high)
            .fold(f64::MIN, f64::max);
        series[i].high > neighbours
    })
}

/// Most recent candle whose low undercuts the two lows on each side.
pub fn swing_low(series: &[Candle], lookback: usize) -> Option<usize> {
    swing_candidates(series.len(), lookback).find(|&i| {
        let neighbours = series[i - SWING_SIDE..=i + SWING_SIDE]
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != SWING_SIDE)
            .map(|(_, c)| c.low)
            .fold(f64::MAX, f64::min);
        series[i].low < neighbours
    })
}

/// Lowest low and highest high of the `window` candles before the latest.
fn liquidity_extremes(series: &[Candle], window: usize) -> (Option<f64>, Option<f64>) {
    let n = series.len();
    if window == 0 || n < window + 1 {
        return (None, None);
    }
    let trailing = &series[n - 1 - window..n - 1];
    let low = trailing.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let high = trailing.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    (Some(low), Some(high))
}

/// Opposite-bodied candles followed within four candles by an impulse larger
/// than `min_impulse` times their own spread. Indices are most recent first.
pub fn order_blocks(
    series: &[Candle],
    lookback: usize,
    min_impulse: f64,
    direction: SignalType,
) -> Vec<usize> {
    let n = series.len();
    if n < IMPULSE_CANDLES + 2 {
        return Vec::new();
    }
    let lower = (n + 1).saturating_sub(lookback);
    let upper = n - IMPULSE_CANDLES;

    (lower..=upper)
        .rev()
        .filter(|&i| i + IMPULSE_CANDLES + 1 < n)
        .filter(|&i| {
            let candle = &series[i];
            let next = &series[i + 1..=i + IMPULSE_CANDLES];
            let threshold = candle.spread() * min_impulse;
            match direction {
                SignalType::Bullish => {
                    let peak = next.iter().map(|c| c.high).fold(f64::MIN, f64::max);
                    candle.is_bearish() && peak - candle.high > threshold
                }
                SignalType::Bearish => {
                    let trough = next.iter().map(|c| c.low).fold(f64::MAX, f64::min);
                    candle.is_bullish() && candle.low - trough > threshold
                }
                SignalType::Neutral => false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{candle, structure_base, structure_bearish, structure_tie};

    fn analyzer() -> MarketStructureAnalyzer {
        MarketStructureAnalyzer::new(StructureConfig::default())
    }

    #[test]
    fn too_few_candles_yields_nothing() {
        let series = structure_tie();
        assert!(analyzer().analyze(&series[..49]).is_none());
        assert!(analyzer().read(&series[..49]).is_none());
    }

    #[test]
    fn finds_most_recent_swings() {
        let series = structure_tie();
        assert_eq!(swing_high(&series, 50), Some(40));
        assert_eq!(swing_low(&series, 50), Some(42));
    }

    #[test]
    fn finds_order_blocks_in_both_directions() {
        let series = structure_base();
        assert_eq!(order_blocks(&series, 50, 1.5, SignalType::Bullish), vec![36]);
        assert_eq!(order_blocks(&series, 50, 1.5, SignalType::Bearish), vec![38]);
        // A larger impulse requirement filters both out
        assert!(order_blocks(&series, 50, 5.0, SignalType::Bullish).is_empty());
    }

    #[test]
    fn tie_resolves_bullish() {
        let series = structure_tie();
        let reading = analyzer().read(&series).unwrap();
        assert_eq!(reading.bullish.score(), 3);
        assert_eq!(reading.bearish.score(), 3);

        let signal = analyzer().analyze(&series).unwrap();
        assert_eq!(signal.signal_type, SignalType::Bullish);
        assert_eq!(signal.score, 3);
        assert_eq!(signal.active_signals, vec!["BOS", "Liquidity Grab", "Order Block"]);
        assert_eq!(signal.reason, "Bullish Score 3/5 - Signals: BOS, Liquidity Grab, Order Block");
        assert_eq!(signal.description, "Bullish OBs detected at: [36]");
    }

    #[test]
    fn bearish_breakdown_is_reported() {
        let series = structure_bearish();
        let signal = analyzer().analyze(&series).unwrap();
        assert_eq!(signal.signal_type, SignalType::Bearish);
        assert_eq!(
            signal.reason,
            "Bearish Score 3/5 - Signals: BOS, Strong Bear Candle, Order Block"
        );
        assert_eq!(signal.order_blocks, vec![38]);
    }

    #[test]
    fn quiet_market_scores_below_threshold() {
        let series: Vec<_> = (0..50)
            .map(|i| candle(i, 100.0, 100.5, 99.5, 100.0, 100.0))
            .collect();
        let reading = analyzer().read(&series).unwrap();
        assert_eq!(reading.bullish.score(), 0);
        assert_eq!(reading.bearish.score(), 0);
        assert!(analyzer().analyze(&series).is_none());
    }

    #[test]
    fn change_of_character_needs_close_beyond_swing() {
        let mut series = structure_base();
        // Previous candle closes under the swing low, latest closes above its high
        series[48] = candle(48, 98.2, 98.4, 97.6, 97.8, 100.0);
        series[49] = candle(49, 97.9, 99.0, 97.7, 98.9, 100.0);
        let reading = analyzer().read(&series).unwrap();
        assert!(reading.bullish.choch);
        assert!(!reading.bearish.choch);
    }
}
