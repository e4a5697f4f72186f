use std::path::Path;

use log::{error, info};
use serde::Serialize;

use super::{ArtifactKind, Encoder, RegressionModel, Scaler};
use crate::error::{LoadError, PredictionError, Result};

/// The outcome of loading a single artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Loaded {
        source: String,
    },
    Unavailable {
        source: String,
        error: &'static str,
        reason: String,
    },
}

impl ArtifactStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    fn of<T>(path: &Path, outcome: &std::result::Result<T, LoadError>) -> Self {
        let source = path.display().to_string();
        match outcome {
            Ok(_) => Self::Loaded { source },
            Err(e) => Self::Unavailable {
                source,
                error: e.kind(),
                reason: e.to_string(),
            },
        }
    }
}

/// The load status of every artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub model: ArtifactStatus,
    pub encoder: ArtifactStatus,
    pub scaler: ArtifactStatus,
}

impl LoadReport {
    /// Returns the artifacts that are not available, in pipeline order.
    pub fn missing(&self) -> Vec<ArtifactKind> {
        [
            (ArtifactKind::Encoder, &self.encoder),
            (ArtifactKind::Scaler, &self.scaler),
            (ArtifactKind::Model, &self.model),
        ]
        .into_iter()
        .filter(|(_, status)| !status.is_loaded())
        .map(|(kind, _)| kind)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// The three artifacts the pipeline runs on, each one present only if it loaded.
///
/// A bundle is never mutated once built, it can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    model: Option<RegressionModel>,
    encoder: Option<Encoder>,
    scaler: Option<Scaler>,
    report: LoadReport,
}

impl ArtifactBundle {
    /// Loads every artifact, independently of the others.
    ///
    /// A failure is recorded in the report and logged, it never prevents the remaining
    /// artifacts from being loaded.
    pub fn load_all(model_path: &Path, encoder_path: &Path, scaler_path: &Path) -> Self {
        let model = RegressionModel::load(model_path);
        let encoder = Encoder::load(encoder_path);
        let scaler = Scaler::load(scaler_path);

        let report = LoadReport {
            model: ArtifactStatus::of(model_path, &model),
            encoder: ArtifactStatus::of(encoder_path, &encoder),
            scaler: ArtifactStatus::of(scaler_path, &scaler),
        };

        for (kind, status) in [
            (ArtifactKind::Model, &report.model),
            (ArtifactKind::Encoder, &report.encoder),
            (ArtifactKind::Scaler, &report.scaler),
        ] {
            match status {
                ArtifactStatus::Loaded { source } => info!("{kind} loaded from {source}"),
                ArtifactStatus::Unavailable { reason, .. } => error!("{kind} unavailable: {reason}"),
            }
        }

        Self {
            model: model.ok(),
            encoder: encoder.ok(),
            scaler: scaler.ok(),
            report,
        }
    }

    /// Builds a bundle out of artifacts that are already in memory.
    pub fn from_parts(
        model: Option<RegressionModel>,
        encoder: Option<Encoder>,
        scaler: Option<Scaler>,
    ) -> Self {
        let status = |present: bool| {
            let source = "memory".to_string();
            if present {
                ArtifactStatus::Loaded { source }
            } else {
                ArtifactStatus::Unavailable {
                    source,
                    error: "not_provided",
                    reason: "not provided".to_string(),
                }
            }
        };

        let report = LoadReport {
            model: status(model.is_some()),
            encoder: status(encoder.is_some()),
            scaler: status(scaler.is_some()),
        };

        Self {
            model,
            encoder,
            scaler,
            report,
        }
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn model(&self) -> Option<&RegressionModel> {
        self.model.as_ref()
    }

    pub fn encoder(&self) -> Option<&Encoder> {
        self.encoder.as_ref()
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.scaler.as_ref()
    }

    /// Returns every artifact, or a configuration error naming the missing ones.
    pub fn parts(&self) -> Result<(&Encoder, &Scaler, &RegressionModel)> {
        match (&self.encoder, &self.scaler, &self.model) {
            (Some(encoder), Some(scaler), Some(model)) => Ok((encoder, scaler, model)),
            (encoder, scaler, model) => {
                let missing = [
                    (ArtifactKind::Encoder, encoder.is_none()),
                    (ArtifactKind::Scaler, scaler.is_none()),
                    (ArtifactKind::Model, model.is_none()),
                ]
                .into_iter()
                .filter_map(|(kind, absent)| absent.then_some(kind))
                .collect();

                Err(PredictionError::Configuration { missing })
            }
        }
    }
}
