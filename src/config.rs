//! Service configuration.
//!
//! Non-secret settings live in a TOML file (every field has a default, so an
//! empty or absent file is valid). Secrets and deployment overrides come
//! from the process environment after `.env` has been loaded.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::logging::LogLevel;
use crate::model::SST_SHORT_CIRCUIT_C;

pub const DEFAULT_CONFIG_PATH: &str = "./turtle_risk.toml";

pub const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
pub const ENV_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
pub const ENV_SENDER: &str = "TWILIO_PHONE_NUMBER";
pub const ENV_MODEL_PATH: &str = "TURTLE_MODEL_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub erddap: ErddapConfig,
    pub model: ModelConfig,
    pub assessment: AssessmentConfig,
    pub alerts: AlertConfig,
    pub logging: LoggingConfig,
}

/// One griddap dataset and the variable read from it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    pub dataset_id: String,
    pub variable: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErddapConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub sst: DatasetConfig,
    pub wave_height: DatasetConfig,
}

impl Default for ErddapConfig {
    fn default() -> Self {
        Self {
            base_url: "https://coastwatch.pfeg.noaa.gov/erddap".to_string(),
            timeout_secs: 5,
            sst: DatasetConfig {
                dataset_id: "jplMURSST41".to_string(),
                variable: "analysed_sst".to_string(),
            },
            wave_height: DatasetConfig {
                dataset_id: "NOAA_NDBC_WAVE".to_string(),
                variable: "sea_surface_wave_significant_height".to_string(),
            },
        }
    }
}

impl ErddapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// JSON export of the trained tree ensemble.
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("turtle_risk_model.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    /// Client-reported SST strictly above this skips the classifier.
    pub sst_short_circuit_c: f64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            sst_short_circuit_c: SST_SHORT_CIRCUIT_C,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub api_base: String,
    /// Sender number; `TWILIO_PHONE_NUMBER` overrides it.
    pub sender: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.twilio.com".to_string(),
            sender: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

impl LoggingConfig {
    pub fn min_level(&self) -> Result<LogLevel, ConfigError> {
        self.level.parse().map_err(ConfigError::Invalid)
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Messaging-provider account credentials. Either half may be missing; the
/// provider then refuses to connect and every send fails closed.
#[derive(Clone, Default, PartialEq)]
pub struct MessagingCredentials {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
}

impl std::fmt::Debug for MessagingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl MessagingCredentials {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            account_sid: non_empty(lookup(ENV_ACCOUNT_SID)),
            auth_token: non_empty(lookup(ENV_AUTH_TOKEN)),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn is_complete(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ServiceConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file at the default location falls back
    /// to defaults; a missing file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load `.env`, then the TOML file, then apply environment overrides.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let mut config = Self::load(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(sender) = non_empty(lookup(ENV_SENDER)) {
            self.alerts.sender = Some(sender);
        }
        if let Some(model_path) = non_empty(lookup(ENV_MODEL_PATH)) {
            self.model.path = PathBuf::from(model_path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.erddap.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("erddap.base_url must not be empty".into()));
        }
        if self.erddap.timeout_secs == 0 {
            return Err(ConfigError::Invalid("erddap.timeout_secs must be positive".into()));
        }
        if self.alerts.timeout_secs == 0 {
            return Err(ConfigError::Invalid("alerts.timeout_secs must be positive".into()));
        }
        if !self.assessment.sst_short_circuit_c.is_finite() {
            return Err(ConfigError::Invalid(
                "assessment.sst_short_circuit_c must be a finite number".into(),
            ));
        }
        self.logging.min_level()?;
        Ok(())
    }
}
