//! Turns the three timeframe series into candidate signals.
//!
//! Two independent paths run each analysed cycle: the accumulation path on
//! the short series, and the composite path that merges market structure
//! (mid series) with volume-spread analysis (short series) and then applies
//! the higher-timeframe trend filter.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use common::{round_price, timestamp_id, Candle, Signal, SignalDraft, SignalType};

use crate::config::{CompositeConfig, DetectorConfig};
use crate::indicators::{
    MarketStructureAnalyzer, StructureSignal, VolumeSignal, VolumeSpreadAnalyzer, ZoneDetector,
};

/// Latest series for each timeframe, borrowed for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct Frames<'a> {
    pub short: &'a [Candle],
    pub mid: &'a [Candle],
    pub long: &'a [Candle],
}

/// Which timeframes closed a new candle since the previous analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Freshness {
    pub short: bool,
    pub mid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompositeOutcome {
    None,
    /// A bullish composite suppressed by a falling long-timeframe close.
    Vetoed {
        signal_type: SignalType,
        reasoning: String,
    },
    Signal(Signal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub accumulation: Option<Signal>,
    pub composite: CompositeOutcome,
}

impl Composition {
    fn empty() -> Self {
        Self {
            accumulation: None,
            composite: CompositeOutcome::None,
        }
    }

    pub fn is_vetoed(&self) -> bool {
        matches!(self.composite, CompositeOutcome::Vetoed { .. })
    }

    /// Signals to score, accumulation first.
    pub fn signals(self) -> Vec<Signal> {
        let mut out = Vec::with_capacity(2);
        out.extend(self.accumulation);
        if let CompositeOutcome::Signal(signal) = self.composite {
            out.push(signal);
        }
        out
    }
}

pub struct SignalComposer {
    zone: ZoneDetector,
    structure: MarketStructureAnalyzer,
    volume: VolumeSpreadAnalyzer,
    range_threshold: f64,
    stop_buffer: f64,
    composite: CompositeConfig,
}

impl SignalComposer {
    pub fn new(cfg: DetectorConfig) -> Self {
        Self {
            range_threshold: cfg.zone.range_threshold,
            stop_buffer: cfg.zone.stop_buffer,
            zone: ZoneDetector::new(cfg.zone),
            structure: MarketStructureAnalyzer::new(cfg.structure),
            volume: VolumeSpreadAnalyzer::new(cfg.volume),
            composite: cfg.composite,
        }
    }

    pub fn compose(&self, symbol: &str, frames: &Frames<'_>, fresh: Freshness) -> Composition {
        let Some(short_last) = frames.short.last() else {
            return Composition::empty();
        };

        let accumulation = self.accumulation(symbol, frames.short, short_last);

        let structure = if fresh.mid {
            self.structure.analyze(frames.mid)
        } else {
            None
        };
        let volume = if fresh.short {
            self.volume.analyze(frames.short)
        } else {
            None
        };
        debug!(
            symbol,
            structure = ?structure.as_ref().map(|s| s.signal_type),
            volume = ?volume.as_ref().map(|v| v.signal_type),
            "Detector readings"
        );

        let composite = match merge(structure.as_ref(), volume.as_ref(), frames, short_last) {
            None => CompositeOutcome::None,
            Some(merged) if self.htf_vetoes(merged.signal_type, frames.long) => {
                info!(
                    symbol,
                    signal_type = %merged.signal_type,
                    reasoning = %merged.reasoning,
                    "Composite vetoed by long-timeframe trend"
                );
                CompositeOutcome::Vetoed {
                    signal_type: merged.signal_type,
                    reasoning: merged.reasoning,
                }
            }
            Some(merged) => match self.composite_draft(symbol, merged, short_last.timestamp).build() {
                Ok(signal) => CompositeOutcome::Signal(signal),
                Err(e) => {
                    warn!(symbol, error = %e, "Dropping composite signal");
                    CompositeOutcome::None
                }
            },
        };

        Composition {
            accumulation,
            composite,
        }
    }

    fn accumulation(&self, symbol: &str, short: &[Candle], last: &Candle) -> Option<Signal> {
        let zone = self.zone.detect(short, self.range_threshold)?;
        if !self.zone.confirm(short, &zone) {
            debug!(symbol, "Spring found but entry not confirmed");
            return None;
        }

        let draft = SignalDraft {
            symbol: symbol.to_string(),
            time: last.timestamp,
            id: format!("accum_in_{}", timestamp_id(last.timestamp)),
            signal_type: SignalType::Bullish,
            entry: last.close,
            stop_loss: Some(zone.range_low - self.stop_buffer),
            take_profit: Some(zone.range_high),
            reasoning: "Inside accumulation: spring + bullish confirmation".to_string(),
            description: format!(
                "Accumulation zone: {} - {}",
                round_price(zone.range_low),
                round_price(zone.range_high)
            ),
        };
        draft
            .build()
            .map_err(|e| warn!(symbol, error = %e, "Dropping accumulation signal"))
            .ok()
    }

    /// A bullish composite is vetoed while the long-timeframe close sits below
    /// its value `trend_lookback - 1` candles earlier.
    fn htf_vetoes(&self, signal_type: SignalType, long: &[Candle]) -> bool {
        let lookback = self.composite.trend_lookback;
        if signal_type != SignalType::Bullish || lookback < 2 || long.len() < lookback {
            return false;
        }
        let n = long.len();
        long[n - 1].close < long[n - lookback].close
    }

    fn composite_draft(&self, symbol: &str, merged: Merged, time: DateTime<Utc>) -> SignalDraft {
        let entry = merged.entry;
        let (stop_loss, take_profit) = match merged.signal_type {
            SignalType::Bullish => (
                Some(entry - self.composite.stop_offset),
                Some(entry + self.composite.target_offset),
            ),
            SignalType::Bearish => (
                Some(entry + self.composite.stop_offset),
                Some(entry - self.composite.target_offset),
            ),
            SignalType::Neutral => (None, None),
        };

        SignalDraft {
            symbol: symbol.to_string(),
            time,
            id: merged.id,
            signal_type: merged.signal_type,
            entry,
            stop_loss,
            take_profit,
            reasoning: merged.reasoning,
            description: merged.description,
        }
    }
}

/// Composite fields before levels are attached.
struct Merged {
    signal_type: SignalType,
    entry: f64,
    id: String,
    reasoning: String,
    description: String,
}

fn merge(
    structure: Option<&StructureSignal>,
    volume: Option<&VolumeSignal>,
    frames: &Frames<'_>,
    short_last: &Candle,
) -> Option<Merged> {
    let short_ref = || (short_last.close, timestamp_id(short_last.timestamp));

    let (signal_type, (entry, id), reasoning) = match (structure, volume) {
        (Some(s), Some(v)) if s.signal_type == v.signal_type => (
            s.signal_type,
            short_ref(),
            format!("SMC + VSA Confluence: {} and {}", s.reason, v.reason),
        ),
        (Some(s), _) => {
            let mid_last = frames.mid.last()?;
            (
                s.signal_type,
                (mid_last.close, format!("smc_{}", timestamp_id(short_last.timestamp))),
                format!("SMC only: {}", s.reason),
            )
        }
        (None, Some(v)) => (v.signal_type, short_ref(), format!("VSA only: {}", v.reason)),
        (None, None) => return None,
    };

    let description = match (structure, volume) {
        (Some(s), _) if s.signal_type == signal_type => s.description.clone(),
        (_, Some(v)) if v.signal_type == signal_type => v.description.to_string(),
        _ => String::new(),
    };

    Some(Merged {
        signal_type,
        entry,
        id,
        reasoning,
        description,
    })
}
