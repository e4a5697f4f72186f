use serde::{Deserialize, Serialize};

use crate::{
    artifacts::LoadReport,
    error::PredictionError,
    query::{HouseQuery, PredictedPrice},
};

/// A request line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    Predict(HouseQuery),
    Locations,
    Status,
    Reload,
}

/// A response line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Price { lakhs: f64, display: String },
    Error { kind: &'static str, message: String },
    Locations(Vec<String>),
    Status(LoadReport),
}

impl Response {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::Error {
            kind: "bad_request",
            message: reason.into(),
        }
    }
}

impl From<PredictedPrice> for Response {
    fn from(price: PredictedPrice) -> Self {
        Self::Price {
            lakhs: price.lakhs(),
            display: price.to_string(),
        }
    }
}

impl From<PredictionError> for Response {
    fn from(e: PredictionError) -> Self {
        Self::Error {
            kind: e.kind(),
            message: e.user_message(),
        }
    }
}
