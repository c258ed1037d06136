use std::sync::Arc;

use tracing::{info, warn};

use common::{Error, Result, Signal};

use crate::features::SignalFeatures;

/// Predicts the probability that a signal reaches its target.
pub trait SignalScorer: Send + Sync {
    /// `Error::ScorerUnavailable` when no trained artifact exists.
    fn predict(&self, features: &SignalFeatures) -> Result<f64>;
}

/// Accepts or rejects signals by their predicted quality.
///
/// Scoring fails open: without a usable scorer every signal scores 1.0.
#[derive(Clone)]
pub struct QualityGate {
    scorer: Arc<dyn SignalScorer>,
    threshold: f64,
}

impl QualityGate {
    pub fn new(scorer: Arc<dyn SignalScorer>, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn score(&self, signal: &Signal) -> f64 {
        let features = SignalFeatures::from_signal(signal);
        match self.scorer.predict(&features) {
            Ok(score) => score,
            Err(Error::ScorerUnavailable(reason)) => {
                info!(signal_id = %signal.id, %reason, "No quality model, accepting signal");
                1.0
            }
            Err(e) => {
                warn!(signal_id = %signal.id, error = %e, "Quality scoring failed, accepting signal");
                1.0
            }
        }
    }

    /// Inclusive at the threshold.
    pub fn accepts(&self, score: f64) -> bool {
        score >= self.threshold
    }
}
