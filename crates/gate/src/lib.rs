pub mod features;
pub mod forest;
pub mod gate;

pub use features::{signal_code, SignalFeatures};
pub use forest::{ForestModel, ForestScorer};
pub use gate::{QualityGate, SignalScorer};
