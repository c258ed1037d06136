use serde::{Deserialize, Serialize};

/// Detector parameters, optionally loaded from a TOML file.
///
/// Every field has a default, so a file only needs the values it overrides.
/// Example `config/detectors.toml`:
/// ```toml
/// [zone]
/// range_threshold = 0.008
///
/// [structure]
/// lookback = 60
/// min_impulse = 2.0
///
/// [composite]
/// stop_offset = 0.003
/// target_offset = 0.006
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub zone: ZoneConfig,
    pub structure: StructureConfig,
    pub volume: VolumeConfig,
    pub composite: CompositeConfig,
}

impl DetectorConfig {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path).unwrap_or_else(|e| {
            panic!("Failed to read detector config at '{path}': {e}")
        });
        toml::from_str(&content).unwrap_or_else(|e| {
            panic!("Failed to parse detector config at '{path}': {e}")
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Candles in the reference range preceding the spring candidate.
    pub window: usize,
    /// Maximum range size as a fraction of price.
    pub range_threshold: f64,
    /// Rolling window for the volume contraction check.
    pub volume_window: usize,
    /// Trailing candles averaged for the wide-spread confirmation.
    pub spread_window: usize,
    /// Distance below the range low for the stop (absolute price units).
    pub stop_buffer: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            window: 20,
            range_threshold: 0.01,
            volume_window: 5,
            spread_window: 5,
            stop_buffer: 0.001,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StructureConfig {
    pub lookback: usize,
    /// Order-block impulse must exceed this multiple of the candle's spread.
    pub min_impulse: f64,
    /// Points (out of 5) a direction needs to emit a result.
    pub min_score: u8,
    /// Candles before the latest scanned for the liquidity grab extreme.
    pub liquidity_window: usize,
    /// Body/spread ratio of a strong directional candle.
    pub strong_body_ratio: f64,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            lookback: 50,
            min_impulse: 1.5,
            min_score: 3,
            liquidity_window: 10,
            strong_body_ratio: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Reversal volume as a multiple of the trailing average.
    pub reversal_volume: f64,
    /// Absorption volume as a multiple of the trailing average.
    pub absorption_volume: f64,
    /// Minimum body/spread ratio of a reversal candle.
    pub reversal_body: f64,
    /// Maximum body/spread ratio of an absorption candle.
    pub absorption_body: f64,
    /// Fraction of the spread, measured from the extreme, the close must land in.
    pub close_zone: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            reversal_volume: 1.5,
            absorption_volume: 2.0,
            reversal_body: 0.6,
            absorption_body: 0.3,
            close_zone: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Stop distance from entry (absolute price units).
    pub stop_offset: f64,
    /// Target distance from entry (absolute price units).
    pub target_offset: f64,
    /// Long-timeframe candles compared by the trend filter.
    pub trend_lookback: usize,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            stop_offset: 0.002,
            target_offset: 0.004,
            trend_lookback: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: DetectorConfig = toml::from_str(
            r#"
            [structure]
            lookback = 60

            [composite]
            stop_offset = 0.003
            "#,
        )
        .unwrap();

        assert_eq!(cfg.structure.lookback, 60);
        assert_eq!(cfg.structure.min_score, 3);
        assert_eq!(cfg.composite.stop_offset, 0.003);
        assert_eq!(cfg.composite.target_offset, 0.004);
        assert_eq!(cfg.zone.window, 20);
        assert_eq!(cfg.volume.reversal_volume, 1.5);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg: DetectorConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.zone.range_threshold, 0.01);
        assert_eq!(cfg.zone.stop_buffer, 0.001);
    }
}
