use std::path::{Path, PathBuf};

use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::{debug, error};

use common::{Error, Result};

use crate::features::SignalFeatures;
use crate::gate::SignalScorer;

/// Serialized form of the trained scorer artifact.
pub type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Scores signals with a smartcore random forest stored as JSON.
///
/// The artifact is read on every prediction so a retrained model written by
/// the feedback tooling is used from the next signal on.
pub struct ForestScorer {
    model_path: PathBuf,
}

impl ForestScorer {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn load_model(&self) -> Result<ForestModel> {
        let bytes = match std::fs::read(&self.model_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ScorerUnavailable(format!(
                    "no model at {}",
                    self.model_path.display()
                )));
            }
            Err(e) => {
                error!(path = %self.model_path.display(), error = %e, "Failed to read model file");
                return Err(Error::ScorerUnavailable(e.to_string()));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(path = %self.model_path.display(), error = %e, "Failed to deserialize model");
            Error::ScorerUnavailable(format!("unreadable model: {e}"))
        })
    }
}

impl SignalScorer for ForestScorer {
    fn predict(&self, features: &SignalFeatures) -> Result<f64> {
        let model = self.load_model()?;

        let input = DenseMatrix::from_2d_vec(&vec![features.to_vec()])
            .map_err(|e| Error::Scorer(format!("Matrix creation failed: {e}")))?;
        let predictions = model
            .predict(&input)
            .map_err(|e| Error::Scorer(format!("Prediction failed: {e}")))?;
        let raw = predictions
            .first()
            .copied()
            .ok_or_else(|| Error::Scorer("No prediction returned".into()))?;

        debug!(raw, "Forest prediction");
        Ok(raw.clamp(0.0, 1.0))
    }
}
