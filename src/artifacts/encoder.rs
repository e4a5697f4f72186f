use std::{collections::HashMap, io, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{FORMAT_VERSION, read_json, write_json};
use crate::error::{LoadError, PredictionError, Result};

/// What the encoder does with a value it was not fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Refuse the value.
    #[default]
    Error,
    /// Map every unknown value to a designated code.
    UseEncodedValue(f32),
}

#[derive(Serialize, Deserialize)]
struct EncoderFile {
    format_version: u32,
    feature: String,
    categories: Vec<String>,
    #[serde(default)]
    handle_unknown: UnknownPolicy,
}

/// An ordinal encoder: the code of a category is its position in the fitted catalog.
#[derive(Debug, Clone)]
pub struct Encoder {
    feature: String,
    categories: Vec<String>,
    codes: HashMap<String, usize>,
    handle_unknown: UnknownPolicy,
}

impl Encoder {
    /// Creates a new `Encoder`.
    ///
    /// # Arguments
    /// * `feature` - The name of the feature being encoded.
    /// * `categories` - The fitted catalog, in code order.
    /// * `handle_unknown` - What to do with values outside of the catalog.
    ///
    /// # Returns
    /// A new `Encoder` or the reason why the parts don't make a valid one.
    pub fn new(
        feature: impl Into<String>,
        categories: Vec<String>,
        handle_unknown: UnknownPolicy,
    ) -> std::result::Result<Self, String> {
        let feature = feature.into();
        if feature.is_empty() {
            return Err("the feature name must not be empty".into());
        }

        if categories.is_empty() {
            return Err("the category catalog must not be empty".into());
        }

        let mut codes = HashMap::with_capacity(categories.len());
        for (code, category) in categories.iter().enumerate() {
            if codes.insert(category.clone(), code).is_some() {
                return Err(format!("category '{category}' appears more than once"));
            }
        }

        if let UnknownPolicy::UseEncodedValue(code) = handle_unknown {
            let collides = code >= 0. && code.fract() == 0. && (code as usize) < categories.len();
            if !code.is_finite() || collides {
                return Err(format!(
                    "the unknown value code {code} must be finite and outside of 0..{}",
                    categories.len()
                ));
            }
        }

        Ok(Self {
            feature,
            categories,
            codes,
            handle_unknown,
        })
    }

    /// Loads an encoder artifact.
    pub fn load(path: &Path) -> std::result::Result<Self, LoadError> {
        let file: EncoderFile = read_json(path)?;
        Self::new(file.feature, file.categories, file.handle_unknown).map_err(|reason| {
            LoadError::Invalid {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    /// Writes the encoder as an artifact.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = EncoderFile {
            format_version: FORMAT_VERSION,
            feature: self.feature.clone(),
            categories: self.categories.clone(),
            handle_unknown: self.handle_unknown,
        };

        write_json(path, &file)
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Returns the fitted catalog, in code order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn handle_unknown(&self) -> UnknownPolicy {
        self.handle_unknown
    }

    /// Maps a category to its numeric code.
    pub fn encode(&self, value: &str) -> Result<f32> {
        if let Some(&code) = self.codes.get(value) {
            return Ok(code as f32);
        }

        match self.handle_unknown {
            UnknownPolicy::Error => Err(PredictionError::UnknownCategory {
                value: value.to_string(),
            }),
            UnknownPolicy::UseEncodedValue(code) => {
                debug!("encoding unknown {} '{value}' as {code}", self.feature);
                Ok(code)
            }
        }
    }
}
