use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::{PredictionError, Result};

/// The only city the artifacts were fitted on.
pub const SUPPORTED_CITY: &str = "Bangalore";

/// Inclusive bounds for the bathroom and bedroom counts.
pub const ROOM_RANGE: (i64, i64) = (1, 10);

/// The attributes of a house whose price should be predicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseQuery {
    #[serde(default = "default_city")]
    city: String,
    total_sqft: f32,
    bath: i64,
    bhk: i64,
    location: String,
}

fn default_city() -> String {
    SUPPORTED_CITY.to_string()
}

impl HouseQuery {
    /// Creates a new query for a house in the supported city.
    ///
    /// The values are not checked here, see [`HouseQuery::validate`].
    pub fn new(total_sqft: f32, bath: i64, bhk: i64, location: impl Into<String>) -> Self {
        Self {
            city: default_city(),
            total_sqft,
            bath,
            bhk,
            location: location.into(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn total_sqft(&self) -> f32 {
        self.total_sqft
    }

    pub fn bath(&self) -> i64 {
        self.bath
    }

    pub fn bhk(&self) -> i64 {
        self.bhk
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Checks every field against its allowed domain.
    ///
    /// Whether the location belongs to the catalog is left to the encoder.
    pub fn validate(&self) -> Result<()> {
        if self.city != SUPPORTED_CITY {
            return Err(invalid(
                "city",
                format!("only {SUPPORTED_CITY} is supported, got '{}'", self.city),
            ));
        }

        if !self.total_sqft.is_finite() || self.total_sqft <= 0. {
            return Err(invalid(
                "total_sqft",
                format!("must be a positive number, got {}", self.total_sqft),
            ));
        }

        check_rooms("bath", self.bath)?;
        check_rooms("bhk", self.bhk)?;

        if self.location.trim().is_empty() {
            return Err(invalid("location", "must not be empty".to_string()));
        }

        Ok(())
    }
}

fn check_rooms(field: &'static str, value: i64) -> Result<()> {
    let (low, high) = ROOM_RANGE;
    if !(low..=high).contains(&value) {
        return Err(invalid(
            field,
            format!("must be between {low} and {high}, got {value}"),
        ));
    }

    Ok(())
}

fn invalid(field: &'static str, reason: String) -> PredictionError {
    PredictionError::Validation { field, reason }
}

/// A predicted price in lakhs, non-negative and rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct PredictedPrice(f64);

impl PredictedPrice {
    /// Turns a raw model output into a price.
    pub fn from_raw(raw: f32) -> Self {
        Self((f64::from(raw).abs() * 100.).round() / 100.)
    }

    pub fn lakhs(&self) -> f64 {
        self.0
    }
}

impl Display for PredictedPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹ {:.2} Lakhs", self.0)
    }
}
