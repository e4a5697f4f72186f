use log::{debug, error, warn};

use crate::{
    artifacts::{ArtifactBundle, Encoder, Scaler},
    error::{PredictionError, Result},
    query::{HouseQuery, PredictedPrice},
};

/// The query with its location replaced by the encoder's code, addressed by feature name.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures<'a> {
    pub total_sqft: f32,
    pub bath: f32,
    pub bhk: f32,
    location_feature: &'a str,
    pub location_code: f32,
}

impl EncodedFeatures<'_> {
    /// The amount of features a query is encoded into.
    pub const LEN: usize = 4;

    /// Returns the value of the `name` feature, if the query has one.
    pub fn get(&self, name: &str) -> Option<f32> {
        match name {
            "total_sqft" => Some(self.total_sqft),
            "bath" => Some(self.bath),
            "bhk" => Some(self.bhk),
            name if name == self.location_feature => Some(self.location_code),
            _ => None,
        }
    }
}

/// Turns a `HouseQuery` into a `PredictedPrice`: encoder, then scaler, then model.
///
/// The pipeline holds no state, every call only reads the bundle it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferencePipeline;

impl InferencePipeline {
    pub fn new() -> Self {
        Self
    }

    /// Predicts the price of the house described by `query`.
    ///
    /// # Errors
    /// * `Configuration` if any artifact is missing from `bundle`, before anything else runs.
    /// * `Validation` if a field of `query` is outside of its domain.
    /// * `UnknownCategory` if the encoder refuses the location.
    /// * `Scaling` or `Inference` if the artifacts don't agree with each other.
    pub fn predict(&self, query: &HouseQuery, bundle: &ArtifactBundle) -> Result<PredictedPrice> {
        let outcome = self.run(query, bundle);

        match &outcome {
            Ok(price) => debug!("predicted {price} for {query:?}"),
            Err(e @ (PredictionError::Scaling(_) | PredictionError::Inference(_))) => {
                error!("prediction failed for {query:?}: {e}")
            }
            Err(e) => debug!("prediction refused for {query:?}: {e}"),
        }

        outcome
    }

    fn run(&self, query: &HouseQuery, bundle: &ArtifactBundle) -> Result<PredictedPrice> {
        let (encoder, scaler, model) = bundle.parts()?;
        query.validate()?;

        let encoded = self.encode(query, encoder)?;
        let features = self.assemble(&encoded, scaler)?;
        let scaled = scaler.transform(&features)?;
        let raw = model.predict(&scaled)?;

        Ok(self.post_process(raw))
    }

    /// Replaces the location with its numeric code.
    pub fn encode<'a>(
        &self,
        query: &HouseQuery,
        encoder: &'a Encoder,
    ) -> Result<EncodedFeatures<'a>> {
        Ok(EncodedFeatures {
            total_sqft: query.total_sqft(),
            bath: query.bath() as f32,
            bhk: query.bhk() as f32,
            location_feature: encoder.feature(),
            location_code: encoder.encode(query.location())?,
        })
    }

    /// Lays the features out in the order the scaler was fitted with.
    ///
    /// The scaler must name every encoded feature exactly once.
    pub fn assemble(&self, encoded: &EncodedFeatures, scaler: &Scaler) -> Result<Vec<f32>> {
        let names = scaler.feature_names();
        if names.len() != EncodedFeatures::LEN {
            return Err(PredictionError::Scaling(format!(
                "the scaler was fitted with {} features, the query has {}",
                names.len(),
                EncodedFeatures::LEN
            )));
        }

        names
            .iter()
            .map(|name| {
                encoded.get(name).ok_or_else(|| {
                    PredictionError::Scaling(format!("the scaler expects an unknown feature '{name}'"))
                })
            })
            .collect()
    }

    /// Takes the absolute value of the raw output and rounds it to two decimals.
    pub fn post_process(&self, raw: f32) -> PredictedPrice {
        // TODO: drop the absolute value once the model is retrained without negative outputs.
        if raw < 0. {
            warn!("the model predicted a negative price ({raw}), reporting its absolute value");
        }

        PredictedPrice::from_raw(raw)
    }
}
