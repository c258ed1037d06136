use common::{Candle, SignalType};

use crate::config::VolumeConfig;

/// Candles required: the latest plus the nine averaged before it.
const MIN_CANDLES: usize = 10;

/// Volume-spread pattern found on the latest candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumePattern {
    BullishReversal,
    BearishReversal,
    Absorption,
}

impl VolumePattern {
    pub fn signal_type(self) -> SignalType {
        match self {
            VolumePattern::BullishReversal => SignalType::Bullish,
            VolumePattern::BearishReversal => SignalType::Bearish,
            VolumePattern::Absorption => SignalType::Neutral,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            VolumePattern::BullishReversal => "VSA Bullish Reversal",
            VolumePattern::BearishReversal => "VSA Bearish Reversal",
            VolumePattern::Absorption => "Absorption or Trap Detected (VSA)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VolumePattern::BullishReversal => {
                "Accumulation detected - strong buying pressure on high volume. \
                 Price closed near the high with a large body and wide spread. \
                 Potential reversal zone indicating buyers stepping in. \
                 Watch for follow-through confirmation."
            }
            VolumePattern::BearishReversal => {
                "Distribution detected - strong selling pressure on high volume. \
                 Price closed near the low with a large body and wide spread. \
                 Potential reversal zone indicating sellers dominating. \
                 Beware of fake breakouts or trend changes."
            }
            VolumePattern::Absorption => {
                "Absorption volume detected - large volume with a small candle body. \
                 Aggressive buying or selling absorbing opposing pressure. \
                 Possible fake breakout or trap setup. \
                 Price may be preparing to reverse or continue after this consolidation."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSignal {
    pub pattern: VolumePattern,
    pub signal_type: SignalType,
    pub reason: &'static str,
    pub description: &'static str,
}

impl From<VolumePattern> for VolumeSignal {
    fn from(pattern: VolumePattern) -> Self {
        Self {
            pattern,
            signal_type: pattern.signal_type(),
            reason: pattern.reason(),
            description: pattern.description(),
        }
    }
}

/// Classifies the latest candle from its volume against the trailing
/// average and its body/close position within the spread.
///
/// Evaluation order is fixed: bullish reversal, bearish reversal, absorption.
#[derive(Debug, Clone)]
pub struct VolumeSpreadAnalyzer {
    cfg: VolumeConfig,
}

impl VolumeSpreadAnalyzer {
    pub fn new(cfg: VolumeConfig) -> Self {
        Self { cfg }
    }

    pub fn analyze(&self, series: &[Candle]) -> Option<VolumeSignal> {
        if series.len() < MIN_CANDLES {
            return None;
        }

        let n = series.len();
        let last = &series[n - 1];
        let preceding = &series[n - MIN_CANDLES..n - 1];
        let avg_volume = preceding.iter().map(|c| c.volume).sum::<f64>() / preceding.len() as f64;
        let spread = last.spread();
        let body = last.body();
        let cfg = &self.cfg;

        let bullish_reversal = last.is_bullish()
            && last.close > last.high - cfg.close_zone * spread
            && body > cfg.reversal_body * spread
            && last.volume > cfg.reversal_volume * avg_volume;
        let bearish_reversal = last.is_bearish()
            && last.close < last.low + cfg.close_zone * spread
            && body > cfg.reversal_body * spread
            && last.volume > cfg.reversal_volume * avg_volume;
        let absorption =
            last.volume > cfg.absorption_volume * avg_volume && body < cfg.absorption_body * spread;

        let pattern = if bullish_reversal {
            VolumePattern::BullishReversal
        } else if bearish_reversal {
            VolumePattern::BearishReversal
        } else if absorption {
            VolumePattern::Absorption
        } else {
            return None;
        };
        Some(pattern.into())
    }
}
