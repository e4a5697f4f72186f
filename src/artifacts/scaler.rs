use std::{collections::HashSet, io, path::Path};

use serde::{Deserialize, Serialize};

use super::{FORMAT_VERSION, read_json, write_json};
use crate::error::{LoadError, PredictionError, Result};

/// The fitted parameters of a scaler, one entry per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f32>, scale: Vec<f32> },
    /// `(x - data_min) / data_range`
    MinMax {
        data_min: Vec<f32>,
        data_range: Vec<f32>,
    },
}

impl ScalerKind {
    /// Returns the per-feature offset and divisor.
    fn params(&self) -> (&[f32], &[f32]) {
        match self {
            Self::Standard { mean, scale } => (mean, scale),
            Self::MinMax {
                data_min,
                data_range,
            } => (data_min, data_range),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ScalerFile {
    format_version: u32,
    feature_names: Vec<String>,
    kind: ScalerKind,
}

/// A fitted per-feature affine normalization.
///
/// The feature order is the one the scaler was fitted with, carried in the artifact itself.
#[derive(Debug, Clone)]
pub struct Scaler {
    feature_names: Vec<String>,
    kind: ScalerKind,
}

impl Scaler {
    /// Creates a new `Scaler`.
    ///
    /// # Arguments
    /// * `feature_names` - The features, in the order the scaler was fitted with.
    /// * `kind` - The fitted parameters.
    ///
    /// # Returns
    /// A new `Scaler` or the reason why the parts don't make a valid one.
    pub fn new(feature_names: Vec<String>, kind: ScalerKind) -> std::result::Result<Self, String> {
        if feature_names.is_empty() {
            return Err("the scaler must have at least one feature".into());
        }

        let mut seen = HashSet::with_capacity(feature_names.len());
        if let Some(dup) = feature_names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(format!("feature '{dup}' appears more than once"));
        }

        let (offset, divisor) = kind.params();
        if offset.len() != feature_names.len() || divisor.len() != feature_names.len() {
            return Err(format!(
                "expected {} parameters per field, got {} offsets and {} divisors",
                feature_names.len(),
                offset.len(),
                divisor.len()
            ));
        }

        if offset.iter().any(|v| !v.is_finite()) {
            return Err("every offset must be finite".into());
        }

        if divisor.iter().any(|v| !v.is_finite() || *v == 0.) {
            return Err("every divisor must be finite and non-zero".into());
        }

        Ok(Self {
            feature_names,
            kind,
        })
    }

    pub fn standard(
        feature_names: Vec<String>,
        mean: Vec<f32>,
        scale: Vec<f32>,
    ) -> std::result::Result<Self, String> {
        Self::new(feature_names, ScalerKind::Standard { mean, scale })
    }

    pub fn min_max(
        feature_names: Vec<String>,
        data_min: Vec<f32>,
        data_range: Vec<f32>,
    ) -> std::result::Result<Self, String> {
        Self::new(
            feature_names,
            ScalerKind::MinMax {
                data_min,
                data_range,
            },
        )
    }

    /// Loads a scaler artifact.
    pub fn load(path: &Path) -> std::result::Result<Self, LoadError> {
        let file: ScalerFile = read_json(path)?;
        Self::new(file.feature_names, file.kind).map_err(|reason| LoadError::Invalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Writes the scaler as an artifact.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = ScalerFile {
            format_version: FORMAT_VERSION,
            feature_names: self.feature_names.clone(),
            kind: self.kind.clone(),
        };

        write_json(path, &file)
    }

    /// Returns the feature names in the order `transform` expects them.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn kind(&self) -> &ScalerKind {
        &self.kind
    }

    /// Normalizes a feature vector laid out in `feature_names` order.
    pub fn transform(&self, x: &[f32]) -> Result<Vec<f32>> {
        if x.len() != self.feature_names.len() {
            return Err(PredictionError::Scaling(format!(
                "the scaler was fitted with {} features, got {}",
                self.feature_names.len(),
                x.len()
            )));
        }

        let (offset, divisor) = self.kind.params();
        Ok(x.iter()
            .zip(offset)
            .zip(divisor)
            .map(|((x, offset), divisor)| (x - offset) / divisor)
            .collect())
    }
}
