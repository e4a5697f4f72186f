pub mod artifacts;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod service;

pub use artifacts::{ArtifactBundle, ArtifactStatus, ArtifactStore, LoadReport};
pub use config::Config;
pub use error::{LoadError, PredictionError, Result};
pub use pipeline::InferencePipeline;
pub use query::{HouseQuery, PredictedPrice};
