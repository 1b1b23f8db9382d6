use secrecy::{ExposeSecret, SecretBox};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::fer::DetectorConfig;
use crate::speech::PiperConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
    #[error("Environment error: {0}")]
    EnvError(#[from] env::VarError),
}

/// Startup-time configuration for the whole device.
///
/// Everything is read once from the environment (with `.env` support for
/// development); nothing is reloadable at runtime.
#[derive(Debug)]
pub struct SentryConfig {
    /// Gateway bind address.
    pub host: String,
    pub port: u16,

    /// Action queue slots. Small by design; see the bus module.
    pub bus_capacity: usize,

    /// Frustration detector tuning.
    pub detector: DetectorConfig,
    /// Classifier poll cadence.
    pub sample_interval: Duration,
    /// FER sidecar endpoint. Unset disables the emotion source.
    pub fer_service_url: Option<String>,

    /// Minimum spacing between accepted button presses.
    pub button_refractory: Duration,
    /// GPIO value file polled for rising edges.
    pub button_value_path: PathBuf,
    pub button_poll_interval: Duration,

    /// Laptop-side capture+OCR+advise endpoint.
    pub laptop_client_url: String,
    /// OpenRouter credential for the advice generator.
    pub openrouter_key: SecretBox<String>,

    /// Upper bound on any single enrichment call.
    pub enrichment_timeout: Duration,
    /// Upper bound on one synthesis run.
    pub speech_timeout: Duration,

    /// Piper TTS binary and voice model.
    pub piper: PiperConfig,
}

impl SentryConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let threshold: u32 = var_or("FER_FRUSTRATION_THRESHOLD", 100)?;
        if threshold == 0 {
            return Err(ConfigError::InvalidValue {
                var: "FER_FRUSTRATION_THRESHOLD".to_string(),
                reason: "threshold must be at least 1".to_string(),
            });
        }

        let confidence_floor: f32 = var_or("FER_CONFIDENCE_THRESHOLD", 0.5)?;
        if !(0.0..=1.0).contains(&confidence_floor) {
            return Err(ConfigError::InvalidValue {
                var: "FER_CONFIDENCE_THRESHOLD".to_string(),
                reason: "confidence must be between 0.0 and 1.0".to_string(),
            });
        }

        let bus_capacity: usize = var_or("BUS_CAPACITY", 8)?;
        if bus_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                var: "BUS_CAPACITY".to_string(),
                reason: "the action queue needs at least one slot".to_string(),
            });
        }

        let detector = DetectorConfig {
            threshold,
            confidence_floor,
            cooldown: Duration::from_secs(var_or("FER_COOLDOWN_SECS", 30)?),
            ..DetectorConfig::default()
        };

        let button_value_path = match env::var("BUTTON_VALUE_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => {
                let pin: u32 = var_or("BUTTON_GPIO_PIN", 17)?;
                PathBuf::from(format!("/sys/class/gpio/gpio{pin}/value"))
            }
        };

        Ok(Self {
            host: env::var("PI_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: var_or("PI_PORT", 5000)?,
            bus_capacity,
            detector,
            sample_interval: Duration::from_millis(var_or("FER_POLL_INTERVAL_MS", 100)?),
            fer_service_url: env::var("FER_SERVICE_URL").ok(),
            button_refractory: Duration::from_secs_f64(var_or("BUTTON_DEBOUNCE_TIME", 1.0)?),
            button_value_path,
            button_poll_interval: Duration::from_millis(var_or("BUTTON_POLL_INTERVAL_MS", 20)?),
            laptop_client_url: env::var("LAPTOP_CLIENT_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5001/get-help".to_string()),
            openrouter_key: load_secret("OPENROUTER_API_KEY")?,
            enrichment_timeout: Duration::from_secs(var_or("ENRICHMENT_TIMEOUT_SECS", 30)?),
            speech_timeout: Duration::from_secs(var_or("SPEECH_TIMEOUT_SECS", 30)?),
            piper: PiperConfig {
                executable: PathBuf::from(
                    env::var("PIPER_EXECUTABLE_PATH")
                        .unwrap_or_else(|_| "./piper/piper".to_string()),
                ),
                voice_model: PathBuf::from(
                    env::var("PIPER_VOICE_MODEL")
                        .unwrap_or_else(|_| "./piper/en_US-lessac-medium.onnx".to_string()),
                ),
            },
        })
    }

    /// Get the OpenRouter API key (use only when making API calls)
    pub fn openrouter_key(&self) -> &str {
        self.openrouter_key.expose_secret()
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
fn var_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
            var: key.to_string(),
            reason: err.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Load and validate a required secret from the environment.
fn load_secret(key: &str) -> Result<SecretBox<String>, ConfigError> {
    let value = env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            var: key.to_string(),
            reason: "value cannot be empty".to_string(),
        });
    }
    Ok(SecretBox::new(Box::new(value)))
}

/// Load configuration with helpful error messages for development
pub fn load_config() -> Result<SentryConfig, ConfigError> {
    match SentryConfig::load() {
        Ok(config) => {
            log::info!("Successfully loaded configuration");
            Ok(config)
        }
        Err(ConfigError::MissingEnvVar(var)) => {
            log::error!("Missing required environment variable: {}", var);
            log::error!("Create a .env file in the project root with:");
            log::error!("{}=your_value_here", var);
            Err(ConfigError::MissingEnvVar(var))
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}
