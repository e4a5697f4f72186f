#![allow(dead_code)]

use house_price::{
    Config,
    artifacts::{Encoder, RegressionModel, Scaler, UnknownPolicy},
};
use machine_learning::{
    io::Checkpoint,
    specs::{ActFnSpec, LayerSpec, ModelSpec},
};
use tempfile::TempDir;

pub const LOCATIONS: [&str; 6] = [
    "1st Block Jayanagar",
    "Electronic City",
    "Hebbal",
    "Koramangala",
    "Whitefield",
    "Yelahanka",
];

pub fn encoder(policy: UnknownPolicy) -> Encoder {
    Encoder::new("location", LOCATIONS.map(String::from).to_vec(), policy).unwrap()
}

pub fn scaler() -> Scaler {
    Scaler::standard(
        ["total_sqft", "bath", "bhk", "location"]
            .map(String::from)
            .to_vec(),
        vec![1500., 2.5, 2.6, 2.5],
        vec![1200., 1.3, 1.2, 1.7],
    )
    .unwrap()
}

/// A small `4 -> 8 -> 1` relu network with fixed, arbitrary parameters.
pub fn model() -> RegressionModel {
    let spec = ModelSpec::Sequential {
        layers: vec![
            LayerSpec::Dense {
                dim: (4, 8),
                act_fn: Some(ActFnSpec::Relu),
            },
            LayerSpec::Dense {
                dim: (8, 1),
                act_fn: None,
            },
        ],
    };
    let params = (0..49).map(|i| ((i % 7) as f32 - 3.) / 4.).collect();
    RegressionModel::new(Checkpoint::new(spec, params).unwrap()).unwrap()
}

/// Writes every artifact to a fresh directory.
///
/// # Returns
/// The directory, which must outlive the config, and a config pointing into it.
pub fn artifacts_dir() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let config = Config {
        model_path: dir.path().join("real_estate_model.safetensors"),
        encoder_path: dir.path().join("encoder.json"),
        scaler_path: dir.path().join("scaler.json"),
        ..Config::default()
    };

    model().save(&config.model_path).unwrap();
    encoder(UnknownPolicy::Error)
        .save(&config.encoder_path)
        .unwrap();
    scaler().save(&config.scaler_path).unwrap();

    (dir, config)
}

/// Returns whether `value` has at most two decimals.
pub fn has_two_decimals(value: f64) -> bool {
    let cents = value * 100.;
    (cents - cents.round()).abs() < 1e-6
}
