//! The pre-trained objects the pipeline runs on: a categorical encoder, a numeric scaler and a
//! regression model, each stored in its own file.

mod bundle;
mod encoder;
mod model;
mod scaler;
mod store;

use std::{
    fmt::{self, Display},
    fs, io,
    path::Path,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

pub use bundle::{ArtifactBundle, ArtifactStatus, LoadReport};
pub use encoder::{Encoder, UnknownPolicy};
pub use model::RegressionModel;
pub use scaler::{Scaler, ScalerKind};
pub use store::ArtifactStore;

use crate::error::LoadError;

/// The artifact format version this build reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// The key holding the format version, in JSON artifacts and in the model's metadata.
pub const FORMAT_VERSION_KEY: &str = "format_version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Model,
    Encoder,
    Scaler,
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Model => "model",
            Self::Encoder => "encoder",
            Self::Scaler => "scaler",
        };

        write!(f, "{s}")
    }
}

/// Fails with `VersionMismatch` unless `found` is the supported format version.
fn check_version(path: &Path, found: Option<String>) -> Result<(), LoadError> {
    match found {
        None => Err(LoadError::Invalid {
            path: path.to_path_buf(),
            reason: format!("missing `{FORMAT_VERSION_KEY}`"),
        }),
        Some(found) if found == FORMAT_VERSION.to_string() => Ok(()),
        Some(found) => Err(LoadError::VersionMismatch {
            path: path.to_path_buf(),
            found,
            expected: FORMAT_VERSION,
        }),
    }
}

/// Reads a versioned JSON artifact.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let bytes = fs::read(path).map_err(|e| LoadError::read(path.to_path_buf(), e))?;
    let deserialize = |e: serde_json::Error| LoadError::Deserialize {
        path: path.to_path_buf(),
        source: Box::new(e),
    };

    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(deserialize)?;
    let found = value.get(FORMAT_VERSION_KEY).map(|v| match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    check_version(path, found)?;

    serde_json::from_value(value).map_err(deserialize)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes)
}
