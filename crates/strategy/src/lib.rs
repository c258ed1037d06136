pub mod composer;
pub mod config;
pub mod indicators;

#[cfg(test)]
pub(crate) mod fixtures;

pub use composer::{CompositeOutcome, Composition, Freshness, Frames, SignalComposer};
pub use config::DetectorConfig;
pub use indicators::{
    MarketStructureAnalyzer, StructureSignal, VolumePattern, VolumeSignal, VolumeSpreadAnalyzer,
    ZoneDetector,
};
