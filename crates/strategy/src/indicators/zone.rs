use common::{Candle, Zone};

use crate::config::ZoneConfig;

/// Accumulation range and spring detection.
///
/// The reference range is the `window` candles *preceding* the latest one;
/// the latest candle is the spring candidate measured against that range.
#[derive(Debug, Clone)]
pub struct ZoneDetector {
    cfg: ZoneConfig,
}

impl ZoneDetector {
    pub fn new(cfg: ZoneConfig) -> Self {
        Self { cfg }
    }

    /// Find a tight, volume-contracting range that the latest candle springs from.
    ///
    /// Needs at least `window + 1` candles (21 with the default window of 20):
    /// the full reference range plus the spring candidate. Returns `None` with
    /// less history or unless all three conditions hold.
    pub fn detect(&self, series: &[Candle], range_threshold: f64) -> Option<Zone> {
        let window_len = self.cfg.window;
        let vol_len = self.cfg.volume_window;
        if window_len < 2 || vol_len == 0 || vol_len > window_len || series.len() < window_len + 1 {
            return None;
        }

        let n = series.len();
        let last = &series[n - 1];
        let prev = &series[n - 2];
        let window = &series[n - 1 - window_len..n - 1];

        let range_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let range_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let price = last.close;
        if price <= 0.0 {
            return None;
        }

        let tight_range = (range_high - range_low) / price < range_threshold;
        let volume_contracting =
            mean_volume(&window[window_len - vol_len..]) < mean_volume(&window[..vol_len]);
        let spring = last.low < range_low && last.close > prev.close;

        (tight_range && volume_contracting && spring).then_some(Zone {
            range_high,
            range_low,
        })
    }

    /// Entry confirmation on the latest two candles: a spring against the zone
    /// low, a wide spread versus the trailing average, and a bullish body.
    pub fn confirm(&self, series: &[Candle], zone: &Zone) -> bool {
        let spread_len = self.cfg.spread_window.max(1);
        if series.len() < spread_len.max(2) {
            return false;
        }

        let n = series.len();
        let last = &series[n - 1];
        let prev = &series[n - 2];

        let spring = last.low < zone.range_low && last.close > prev.close;
        let trailing = &series[n - spread_len..];
        let avg_spread = trailing.iter().map(Candle::spread).sum::<f64>() / spread_len as f64;
        let wide_spread = last.spread() > avg_spread;

        spring && wide_spread && last.is_bullish()
    }
}

fn mean_volume(candles: &[Candle]) -> f64 {
    candles.iter().map(|c| c.volume).sum::<f64>() / candles.len() as f64
}
