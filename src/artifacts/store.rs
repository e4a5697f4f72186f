use std::{path::PathBuf, sync::Arc};

use log::{info, warn};
use parking_lot::RwLock;

use super::ArtifactBundle;
use crate::config::Config;

/// Owns the artifact bundle for the life of the process.
///
/// Readers get an `Arc` snapshot of the current bundle. A reload builds a whole new bundle
/// before swapping it in, so a prediction never sees a half-updated one.
#[derive(Debug)]
pub struct ArtifactStore {
    model_path: PathBuf,
    encoder_path: PathBuf,
    scaler_path: PathBuf,
    current: RwLock<Arc<ArtifactBundle>>,
}

impl ArtifactStore {
    /// Creates a new `ArtifactStore`, loading every artifact once.
    pub fn new(config: &Config) -> Self {
        let model_path = config.model_path.clone();
        let encoder_path = config.encoder_path.clone();
        let scaler_path = config.scaler_path.clone();
        let bundle = ArtifactBundle::load_all(&model_path, &encoder_path, &scaler_path);

        Self::report(&bundle);
        Self {
            model_path,
            encoder_path,
            scaler_path,
            current: RwLock::new(Arc::new(bundle)),
        }
    }

    /// Creates a new `ArtifactStore` around an already built bundle.
    ///
    /// Reloading reads the artifacts from the paths in `config`.
    pub fn with_bundle(config: &Config, bundle: ArtifactBundle) -> Self {
        Self {
            model_path: config.model_path.clone(),
            encoder_path: config.encoder_path.clone(),
            scaler_path: config.scaler_path.clone(),
            current: RwLock::new(Arc::new(bundle)),
        }
    }

    /// Returns a snapshot of the current bundle.
    pub fn current(&self) -> Arc<ArtifactBundle> {
        Arc::clone(&self.current.read())
    }

    /// Reads every artifact again and swaps the new bundle in.
    ///
    /// # Returns
    /// The new bundle.
    pub fn reload(&self) -> Arc<ArtifactBundle> {
        info!("reloading artifacts");
        let bundle = Arc::new(ArtifactBundle::load_all(
            &self.model_path,
            &self.encoder_path,
            &self.scaler_path,
        ));

        Self::report(&bundle);
        *self.current.write() = Arc::clone(&bundle);
        bundle
    }

    fn report(bundle: &ArtifactBundle) {
        let missing = bundle.report().missing();
        if missing.is_empty() {
            info!("every artifact is loaded, predictions are enabled");
        } else {
            let names: Vec<_> = missing.iter().map(ToString::to_string).collect();
            warn!(
                "predictions are disabled until {} load",
                names.join(", ")
            );
        }
    }
}
