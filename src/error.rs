use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use crate::artifacts::ArtifactKind;

/// The result type returned by the prediction pipeline.
pub type Result<T> = std::result::Result<T, PredictionError>;

/// Everything that can stop a query from turning into a price.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// One or more artifacts failed to load, no prediction can be made.
    Configuration { missing: Vec<ArtifactKind> },
    /// A query field is outside of its allowed domain.
    Validation { field: &'static str, reason: String },
    /// The location is not part of the encoder's catalog.
    UnknownCategory { value: String },
    /// The feature vector doesn't fit the scaler.
    Scaling(String),
    /// The model couldn't produce a usable value.
    Inference(String),
}

impl PredictionError {
    /// Returns the stable, snake_case name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::Validation { .. } => "validation_error",
            Self::UnknownCategory { .. } => "unknown_category_error",
            Self::Scaling(_) => "scaling_error",
            Self::Inference(_) => "inference_error",
        }
    }

    /// Returns whether the user can fix the error by changing the query.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::UnknownCategory { .. })
    }

    /// Returns the text meant for whoever submitted the query.
    ///
    /// Scaling and inference errors mean the artifacts don't agree with each other, their details
    /// are left out.
    pub fn user_message(&self) -> String {
        match self {
            Self::Scaling(_) | Self::Inference(_) => {
                "internal error while computing the prediction".to_string()
            }
            Self::Configuration { .. } => format!(
                "{self}. Required files are not loaded, prediction cannot be performed"
            ),
            _ => self.to_string(),
        }
    }
}

impl Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { missing } => {
                let names: Vec<_> = missing.iter().map(ArtifactKind::to_string).collect();
                write!(f, "unavailable artifacts: {}", names.join(", "))
            }
            Self::Validation { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::UnknownCategory { value } => write!(f, "unknown location '{value}'"),
            Self::Scaling(reason) => write!(f, "scaling failed: {reason}"),
            Self::Inference(reason) => write!(f, "inference failed: {reason}"),
        }
    }
}

impl Error for PredictionError {}

/// Why an artifact could not be loaded.
#[derive(Debug)]
pub enum LoadError {
    NotFound {
        path: PathBuf,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Deserialize {
        path: PathBuf,
        source: Box<dyn Error + Send + Sync>,
    },
    VersionMismatch {
        path: PathBuf,
        found: String,
        expected: u32,
    },
    Invalid {
        path: PathBuf,
        reason: String,
    },
}

impl LoadError {
    /// Returns the stable, snake_case name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Io { .. } => "io",
            Self::Deserialize { .. } => "deserialize",
            Self::VersionMismatch { .. } => "version_mismatch",
            Self::Invalid { .. } => "invalid",
        }
    }

    pub(crate) fn read(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "file '{}' not found", path.display()),
            Self::Io { path, source } => write!(f, "cannot read '{}': {source}", path.display()),
            Self::Deserialize { path, source } => {
                write!(f, "cannot deserialize '{}': {source}", path.display())
            }
            Self::VersionMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "'{}' has format version {found}, expected {expected}",
                path.display()
            ),
            Self::Invalid { path, reason } => write!(f, "invalid '{}': {reason}", path.display()),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Deserialize { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Errors found while assembling the configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    InvalidEnv { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read '{}': {source}", path.display()),
            Self::Json { path, source } => write!(f, "invalid JSON in '{}': {source}", path.display()),
            Self::InvalidEnv { var, value } => write!(f, "invalid value for {var}: '{value}'"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidEnv { .. } => None,
        }
    }
}
