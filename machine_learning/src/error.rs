use std::{
    error::Error,
    fmt::{self, Display},
};

use safetensors::SafeTensorError;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyModel,
    Overflow(&'static str),
    LayerChain {
        layer: usize,
        got: usize,
        expected: usize,
    },
    MissingMetadata(&'static str),
    MissingTensor(String),
    InvalidTensor {
        name: String,
        reason: String,
    },
    InvalidSpec(serde_json::Error),
    Safetensors(SafeTensorError),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::EmptyModel => write!(f, "The model must have at least one layer"),
            MlErr::Overflow(what) => write!(f, "The {what} doesn't fit in memory"),
            MlErr::LayerChain {
                layer,
                got,
                expected,
            } => write!(
                f,
                "Layer {layer} takes {got} inputs but the previous layer outputs {expected}"
            ),
            MlErr::MissingMetadata(key) => write!(f, "The checkpoint has no `{key}` metadata"),
            MlErr::MissingTensor(name) => write!(f, "The checkpoint has no `{name}` tensor"),
            MlErr::InvalidTensor { name, reason } => write!(f, "Invalid tensor `{name}`: {reason}"),
            MlErr::InvalidSpec(e) => write!(f, "Invalid model spec: {e}"),
            MlErr::Safetensors(e) => write!(f, "Invalid safetensors data: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::InvalidSpec(e) => Some(e),
            MlErr::Safetensors(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SafeTensorError> for MlErr {
    fn from(value: SafeTensorError) -> Self {
        Self::Safetensors(value)
    }
}

impl From<serde_json::Error> for MlErr {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidSpec(value)
    }
}
