use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MODEL_PATH: &str = "real_estate_model.safetensors";
const DEFAULT_ENCODER_PATH: &str = "encoder.json";
const DEFAULT_SCALER_PATH: &str = "scaler.json";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8080";

/// The environment variable naming an optional JSON configuration file.
pub const CONFIG_ENV: &str = "HOUSE_PRICE_CONFIG";

/// Where the artifacts live and how the service runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
    pub scaler_path: PathBuf,
    pub listen_addr: String,
    /// Upper bound for a single prediction in the service, unbounded when absent.
    pub inference_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: DEFAULT_MODEL_PATH.into(),
            encoder_path: DEFAULT_ENCODER_PATH.into(),
            scaler_path: DEFAULT_SCALER_PATH.into(),
            listen_addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            inference_timeout_ms: None,
        }
    }
}

impl Config {
    /// Assembles the configuration: defaults, then the JSON file at `path` (or the one named by
    /// `HOUSE_PRICE_CONFIG`), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_json_file(&path)?,
            None => Self::default(),
        };

        config.with_overrides(|var| env::var(var).ok())
    }

    /// Reads a JSON configuration file, missing fields take their default value.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies the `MODEL_PATH`, `ENCODER_PATH`, `SCALER_PATH`, `HOST`, `PORT` and
    /// `INFERENCE_TIMEOUT_MS` overrides looked up through `var`.
    pub fn with_overrides<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(path) = var("MODEL_PATH") {
            self.model_path = path.into();
        }
        if let Some(path) = var("ENCODER_PATH") {
            self.encoder_path = path.into();
        }
        if let Some(path) = var("SCALER_PATH") {
            self.scaler_path = path.into();
        }

        let host = var("HOST");
        let port = var("PORT");
        if host.is_some() || port.is_some() {
            let (current_host, current_port) = self
                .listen_addr
                .rsplit_once(':')
                .unwrap_or((DEFAULT_HOST, DEFAULT_PORT));

            if let Some(port) = &port {
                port.parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                    var: "PORT",
                    value: port.clone(),
                })?;
            }

            self.listen_addr = format!(
                "{}:{}",
                host.as_deref().unwrap_or(current_host),
                port.as_deref().unwrap_or(current_port)
            );
        }

        if let Some(ms) = var("INFERENCE_TIMEOUT_MS") {
            let ms = ms.parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: "INFERENCE_TIMEOUT_MS",
                value: ms.clone(),
            })?;
            self.inference_timeout_ms = Some(ms);
        }

        Ok(self)
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms.map(Duration::from_millis)
    }
}
