//! Server configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use smartbowl_store::{DEFAULT_INITIAL_AMOUNT, DEFAULT_SAMPLE_COUNT, MAX_ENTRIES, Simulator};
use smartbowl_types::{Device, normalize_device_id};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Test data generation settings.
    pub simulator: SimulatorConfig,
    /// Devices registered at startup.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Server bind address is valid (host:port format)
    /// - Series capacity is at least 1
    /// - Simulator settings are usable
    /// - Every device has an id, a known time zone and a non-negative ration
    /// - No duplicate device ids (ids are case-insensitive)
    ///
    /// # Example
    ///
    /// ```
    /// use smartbowl_service::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.simulator.validate());

        let mut seen_ids = std::collections::HashSet::new();
        for (i, device) in self.devices.iter().enumerate() {
            let prefix = format!("devices[{}]", i);
            errors.extend(device.validate(&prefix));

            if !device.id.is_empty() && !seen_ids.insert(normalize_device_id(&device.id)) {
                errors.push(ValidationError {
                    field: format!("{}.id", prefix),
                    message: format!("duplicate device id '{}'", device.id),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: "bind address cannot be empty".to_string(),
            });
            return errors;
        }

        let Some((_, port)) = self.bind.rsplit_once(':') else {
            errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            });
            return errors;
        };

        match port.parse::<u16>() {
            Ok(0) => errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: "port cannot be 0".to_string(),
            }),
            Err(_) => errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: format!("invalid port '{}': must be a number 1-65535", port),
            }),
            Ok(_) => {}
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Maximum samples kept per device before the oldest are evicted.
    pub max_entries: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_entries: MAX_ENTRIES,
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.max_entries == 0 {
            errors.push(ValidationError {
                field: "storage.max_entries".to_string(),
                message: "series capacity must be at least 1".to_string(),
            });
        }

        errors
    }
}

/// Settings for the generated `test` dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Samples generated per request.
    pub sample_count: usize,
    /// Amount in the bowl before the first generated sample.
    pub initial_amount: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            initial_amount: DEFAULT_INITIAL_AMOUNT,
        }
    }
}

impl SimulatorConfig {
    /// Validate simulator configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.sample_count == 0 {
            errors.push(ValidationError {
                field: "simulator.sample_count".to_string(),
                message: "sample count must be at least 1".to_string(),
            });
        }
        if !self.initial_amount.is_finite() || self.initial_amount < 0.0 {
            errors.push(ValidationError {
                field: "simulator.initial_amount".to_string(),
                message: format!(
                    "initial amount {} must be a non-negative number",
                    self.initial_amount
                ),
            });
        }

        errors
    }

    /// Build a simulator with these settings.
    pub fn simulator(&self) -> Simulator {
        Simulator::new()
            .sample_count(self.sample_count)
            .initial_amount(self.initial_amount)
    }
}

/// A device registered at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Device identifier, as used in `/datasets/{id}`.
    pub id: String,
    /// Human readable name.
    #[serde(default)]
    pub display_name: String,
    /// IANA time zone name.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Daily ration in grams.
    #[serde(default)]
    pub daily_ration: i32,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl DeviceConfig {
    /// Validate device configuration.
    pub fn validate(&self, prefix: &str) -> Vec<ValidationError> {
        validate_device(&self.to_device(), prefix)
    }

    /// The device described by this entry.
    pub fn to_device(&self) -> Device {
        Device::new(
            self.id.clone(),
            self.display_name.clone(),
            self.time_zone.clone(),
            self.daily_ration,
        )
    }
}

/// Check the fields of a device description.
///
/// Field paths in the returned errors start with `prefix`.
pub fn validate_device(device: &Device, prefix: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if device.id.trim().is_empty() {
        errors.push(ValidationError {
            field: format!("{}.id", prefix),
            message: "device id cannot be empty".to_string(),
        });
    } else if device.id.contains('/') {
        errors.push(ValidationError {
            field: format!("{}.id", prefix),
            message: format!("device id '{}' cannot contain '/'", device.id),
        });
    }

    if smartbowl_store::ration::parse_time_zone(&device.time_zone).is_err() {
        errors.push(ValidationError {
            field: format!("{}.time_zone", prefix),
            message: format!("unknown time zone '{}'", device.time_zone),
        });
    }

    if device.daily_ration < 0 {
        errors.push(ValidationError {
            field: format!("{}.daily_ration", prefix),
            message: format!("daily ration {} cannot be negative", device.daily_ration),
        });
    }

    errors
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `devices[0].time_zone`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smartbowl")
        .join("server.toml")
}
