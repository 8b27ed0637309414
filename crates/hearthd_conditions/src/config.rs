//! Configuration file parsing and structures.
//!
//! hearthd_conditions uses TOML for declarative configuration:
//! - `[logging]`: log level and per-target overrides
//! - `[[devices]]` and `[[entities]]`: the devices and sensor entities the engine serves
//!
//! Entities are listed in registry order; a device's conditions come out in the same order.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub devices: Vec<DeviceConfig>,

    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `"hearthd_conditions::sensor" = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build a tracing filter from the default level and the overrides.
    pub fn targets(&self) -> Targets {
        Targets::new()
            .with_default(LevelFilter::from(self.level))
            .with_targets(
                self.overrides
                    .iter()
                    .map(|(target, level)| (target.clone(), LevelFilter::from(*level))),
            )
    }
}

/// A device grouping one or more entities
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub manufacturer: Option<String>,

    #[serde(default)]
    pub model: Option<String>,
}

/// An entity and the metadata the engine reports for it
#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    /// Entity ID (e.g., "sensor.living_room_temperature")
    pub entity_id: String,

    /// ID of the owning device
    #[serde(default)]
    pub device: Option<String>,

    /// Device class (e.g., "temperature", "battery")
    #[serde(default)]
    pub device_class: Option<String>,

    #[serde(default)]
    pub unit_of_measurement: Option<String>,

    /// Initial state value
    #[serde(default)]
    pub state: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        contents.parse()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid entity ID: {0}")]
    InvalidEntityId(String),

    #[error("Entity {0} is defined more than once")]
    DuplicateEntity(String),

    #[error("Device {0} is defined more than once")]
    DuplicateDevice(String),

    #[error("Entity {entity_id} references unknown device {device_id}")]
    UnknownDevice {
        entity_id: String,
        device_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.devices.is_empty());
        assert!(config.entities.is_empty());
    }

    #[test]
    fn test_parse_logging() {
        let toml = r#"
            [logging]
            level = "debug"

            [logging.overrides]
            "hearthd_conditions::sensor" = "trace"
        "#;

        let config: Config = toml.parse().unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.overrides.get("hearthd_conditions::sensor"),
            Some(&LogLevel::Trace)
        );
    }

    #[test]
    fn test_parse_devices_and_entities() {
        let toml = r#"
            [[devices]]
            id = "climate_sensor"
            name = "Living Room Climate"
            manufacturer = "Aqara"

            [[entities]]
            entity_id = "sensor.living_room_temperature"
            device = "climate_sensor"
            device_class = "temperature"
            unit_of_measurement = "°C"
            state = "21.5"

            [[entities]]
            entity_id = "sensor.living_room_status"
            device = "climate_sensor"
        "#;

        let config: Config = toml.parse().unwrap();
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].manufacturer.as_deref(), Some("Aqara"));
        assert!(config.devices[0].model.is_none());

        let ids: Vec<&str> = config
            .entities
            .iter()
            .map(|e| e.entity_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec!["sensor.living_room_temperature", "sensor.living_room_status"]
        );
        assert_eq!(
            config.entities[0].unit_of_measurement.as_deref(),
            Some("°C")
        );
        assert!(config.entities[1].device_class.is_none());
    }

    #[test]
    fn test_invalid_log_level() {
        let toml = r#"
            [logging]
            level = "loud"
        "#;
        assert!(matches!(
            toml.parse::<Config>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/hearthd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearthd.toml");
        std::fs::write(
            &path,
            r#"
            [[devices]]
            id = "plug"
            name = "Smart Plug"
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.devices[0].name, "Smart Plug");
    }
}
