pub mod structure;
pub mod volume;
pub mod zone;

pub use structure::{MarketStructureAnalyzer, StructureSignal};
pub use volume::{VolumePattern, VolumeSignal, VolumeSpreadAnalyzer};
pub use zone::ZoneDetector;
