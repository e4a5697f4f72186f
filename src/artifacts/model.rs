use std::{collections::HashMap, fs, io, path::Path};

use machine_learning::{MlErr, arch::Model, io::Checkpoint};
use ndarray::ArrayView2;

use super::{FORMAT_VERSION, FORMAT_VERSION_KEY, check_version};
use crate::error::{LoadError, PredictionError, Result};

/// A trained regression network producing a single value per input row.
#[derive(Debug, Clone)]
pub struct RegressionModel {
    checkpoint: Checkpoint,
}

impl RegressionModel {
    /// Wraps a checkpoint, which must output a single value.
    pub fn new(checkpoint: Checkpoint) -> std::result::Result<Self, String> {
        let outputs = checkpoint.model().output_size();
        if outputs != 1 {
            return Err(format!("the model must output a single value, it outputs {outputs}"));
        }

        Ok(Self { checkpoint })
    }

    /// Loads a model artifact.
    pub fn load(path: &Path) -> std::result::Result<Self, LoadError> {
        let bytes = fs::read(path).map_err(|e| LoadError::read(path.to_path_buf(), e))?;

        let metadata = machine_learning::io::read_metadata(&bytes)
            .map_err(|e| load_error(path, e))?;
        check_version(path, metadata.get(FORMAT_VERSION_KEY).cloned())?;

        let (checkpoint, _) = Checkpoint::from_safetensors(&bytes).map_err(|e| load_error(path, e))?;
        Self::new(checkpoint).map_err(|reason| LoadError::Invalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Writes the model as an artifact.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let metadata = HashMap::from([(
            FORMAT_VERSION_KEY.to_string(),
            FORMAT_VERSION.to_string(),
        )]);
        let bytes = self
            .checkpoint
            .to_safetensors(metadata)
            .map_err(io::Error::other)?;

        fs::write(path, bytes)
    }

    /// Returns the amount of features the model takes.
    pub fn input_size(&self) -> usize {
        self.checkpoint.model().input_size()
    }

    /// Runs the forward pass on a single scaled feature vector.
    pub fn predict(&self, features: &[f32]) -> Result<f32> {
        if features.len() != self.input_size() {
            return Err(PredictionError::Inference(format!(
                "the model takes {} features, got {}",
                self.input_size(),
                features.len()
            )));
        }

        let x = ArrayView2::from_shape((1, features.len()), features)
            .map_err(|e| PredictionError::Inference(e.to_string()))?;
        let y = self
            .checkpoint
            .forward(x)
            .map_err(|e| PredictionError::Inference(e.to_string()))?;

        let [value] = y.as_slice().unwrap_or_default() else {
            return Err(PredictionError::Inference(format!(
                "expected a single output, got shape {:?}",
                y.shape()
            )));
        };

        if !value.is_finite() {
            return Err(PredictionError::Inference(format!("the model output {value}")));
        }

        Ok(*value)
    }
}

fn load_error(path: &Path, e: MlErr) -> LoadError {
    match e {
        MlErr::Safetensors(_) | MlErr::InvalidSpec(_) => LoadError::Deserialize {
            path: path.to_path_buf(),
            source: Box::new(e),
        },
        e => LoadError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    }
}
