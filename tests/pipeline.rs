mod common;

use std::fs;

use house_price::{
    ArtifactBundle, ArtifactStatus, ArtifactStore, HouseQuery, InferencePipeline, LoadError,
    PredictionError,
    artifacts::{ArtifactKind, RegressionModel, UnknownPolicy},
};

use common::{LOCATIONS, artifacts_dir, has_two_decimals};

fn load(config: &house_price::Config) -> ArtifactBundle {
    ArtifactBundle::load_all(&config.model_path, &config.encoder_path, &config.scaler_path)
}

#[test]
fn whitefield_gets_a_non_negative_rounded_price() {
    let (_dir, config) = artifacts_dir();
    let bundle = load(&config);
    assert!(bundle.report().is_complete());

    let query = HouseQuery::new(1200., 2, 2, "Whitefield");
    let price = InferencePipeline::new().predict(&query, &bundle).unwrap();

    assert!(price.lakhs() >= 0.);
    assert!(has_two_decimals(price.lakhs()));
}

#[test]
fn every_valid_query_gets_a_non_negative_rounded_price() {
    let (_dir, config) = artifacts_dir();
    let bundle = load(&config);
    let pipeline = InferencePipeline::new();

    for location in LOCATIONS {
        for rooms in [1, 3, 10] {
            for sqft in [0.5, 600., 1200., 35000.] {
                let query = HouseQuery::new(sqft, rooms, 11 - rooms, location);
                let price = pipeline.predict(&query, &bundle).unwrap();

                assert!(price.lakhs() >= 0., "{query:?} -> {price}");
                assert!(has_two_decimals(price.lakhs()), "{query:?} -> {price}");
            }
        }
    }
}

#[test]
fn nonexistent_place_is_an_unknown_category() {
    let (_dir, config) = artifacts_dir();
    let bundle = load(&config);

    let query = HouseQuery::new(1000., 2, 2, "Nonexistent Place");
    let err = InferencePipeline::new().predict(&query, &bundle).unwrap_err();

    assert_eq!(
        err,
        PredictionError::UnknownCategory {
            value: "Nonexistent Place".into()
        }
    );
}

#[test]
fn unknown_bucket_is_used_when_the_encoder_says_so() {
    let (_dir, config) = artifacts_dir();
    common::encoder(UnknownPolicy::UseEncodedValue(-1.))
        .save(&config.encoder_path)
        .unwrap();
    let bundle = load(&config);

    let query = HouseQuery::new(1000., 2, 2, "Nonexistent Place");
    let price = InferencePipeline::new().predict(&query, &bundle).unwrap();
    assert!(price.lakhs() >= 0.);
}

#[test]
fn non_positive_area_is_a_validation_error() {
    let (_dir, config) = artifacts_dir();
    let bundle = load(&config);

    for sqft in [0., -250.] {
        let query = HouseQuery::new(sqft, 2, 2, "Whitefield");
        let err = InferencePipeline::new().predict(&query, &bundle).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::Validation {
                field: "total_sqft",
                ..
            }
        ));
    }
}

#[test]
fn any_missing_artifact_is_a_configuration_error() {
    for kind in [ArtifactKind::Model, ArtifactKind::Encoder, ArtifactKind::Scaler] {
        let (_dir, config) = artifacts_dir();
        let path = match kind {
            ArtifactKind::Model => &config.model_path,
            ArtifactKind::Encoder => &config.encoder_path,
            ArtifactKind::Scaler => &config.scaler_path,
        };
        fs::remove_file(path).unwrap();

        let bundle = load(&config);
        let query = HouseQuery::new(1200., 2, 2, "Whitefield");
        let err = InferencePipeline::new().predict(&query, &bundle).unwrap_err();

        assert_eq!(err, PredictionError::Configuration { missing: vec![kind] });
        assert_eq!(bundle.report().missing(), vec![kind]);
    }
}

#[test]
fn predictions_are_idempotent() {
    let (_dir, config) = artifacts_dir();
    let bundle = load(&config);
    let pipeline = InferencePipeline::new();
    let query = HouseQuery::new(1750., 3, 3, "Koramangala");

    let first = pipeline.predict(&query, &bundle).unwrap();
    for _ in 0..10 {
        assert_eq!(pipeline.predict(&query, &bundle).unwrap(), first);
    }
}

#[test]
fn saved_artifacts_predict_like_in_memory_ones() {
    let (_dir, config) = artifacts_dir();
    let from_disk = load(&config);
    let in_memory = ArtifactBundle::from_parts(
        Some(common::model()),
        Some(common::encoder(UnknownPolicy::Error)),
        Some(common::scaler()),
    );

    let query = HouseQuery::new(980., 2, 3, "Hebbal");
    let pipeline = InferencePipeline::new();
    assert_eq!(
        pipeline.predict(&query, &from_disk).unwrap(),
        pipeline.predict(&query, &in_memory).unwrap()
    );
}

#[test]
fn corrupt_and_outdated_models_are_told_apart() {
    let (_dir, config) = artifacts_dir();

    fs::write(&config.model_path, b"this is not a safetensors file").unwrap();
    let err = RegressionModel::load(&config.model_path).unwrap_err();
    assert!(matches!(err, LoadError::Deserialize { .. }), "{err}");

    let scaler = fs::read_to_string(&config.scaler_path).unwrap();
    let outdated = scaler.replacen("\"format_version\": 1", "\"format_version\": 2", 1);
    fs::write(&config.scaler_path, outdated).unwrap();

    let bundle = load(&config);
    assert!(matches!(
        bundle.report().scaler,
        ArtifactStatus::Unavailable {
            error: "version_mismatch",
            ..
        }
    ));
    assert!(bundle.report().encoder.is_loaded());
}

#[test]
fn reload_picks_up_fixed_artifacts() {
    let (_dir, config) = artifacts_dir();
    fs::remove_file(&config.encoder_path).unwrap();

    let store = ArtifactStore::new(&config);
    let before = store.current();
    let query = HouseQuery::new(1200., 2, 2, "Whitefield");
    assert!(InferencePipeline::new().predict(&query, &before).is_err());

    common::encoder(UnknownPolicy::Error)
        .save(&config.encoder_path)
        .unwrap();
    let after = store.reload();

    assert!(InferencePipeline::new().predict(&query, &after).is_ok());
    assert!(InferencePipeline::new().predict(&query, &before).is_err());
}

#[test]
fn scaler_without_the_location_is_a_scaling_error() {
    let (_dir, config) = artifacts_dir();
    house_price::artifacts::Scaler::standard(
        ["total_sqft", "bath", "bhk"].map(String::from).to_vec(),
        vec![1500., 2.5, 2.6],
        vec![1200., 1.3, 1.2],
    )
    .unwrap()
    .save(&config.scaler_path)
    .unwrap();
    let bundle = load(&config);
    assert!(bundle.report().is_complete());

    let query = HouseQuery::new(1200., 2, 2, "Whitefield");
    let err = InferencePipeline::new().predict(&query, &bundle).unwrap_err();
    assert!(matches!(err, PredictionError::Scaling(_)), "{err:?}");
}
