use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::device::Device;
use super::entity::RegistryEntry;
use super::entity::valid_entity_id;
use super::state::SensorState;
use super::state::State;
use crate::condition;
use crate::condition::ConditionChecker;
use crate::condition::NumericStateConfig;
use crate::config::Config;
use crate::config::ConfigError;
use crate::host::Host;
use crate::host::HostError;

/// Metadata the engine keeps for each registered entity.
#[derive(Debug, Clone)]
struct EntityRecord {
    entry: RegistryEntry,
    device_class: Option<String>,
    unit_of_measurement: Option<String>,
}

/// hearthd conditions engine
///
/// Holds the device and entity registries plus a view of the world with State, and serves them to
/// device automation through [`Host`].
pub struct Engine {
    devices: HashMap<String, Device>,

    /// Entity metadata, indexed by entity_id
    entities: HashMap<String, EntityRecord>,

    /// Centralized state snapshot (readers load the Arc, writers store a new one)
    state: ArcSwap<State>,
}

impl Engine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
            entities: HashMap::new(),
            state: ArcSwap::new(Arc::default()),
        }
    }

    /// Build the registries and initial state from configuration
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let mut engine = Self::new();

        for device_cfg in &cfg.devices {
            if engine.devices.contains_key(&device_cfg.id) {
                return Err(ConfigError::DuplicateDevice(device_cfg.id.clone()));
            }
            let mut device = Device::new(device_cfg.id.clone(), device_cfg.name.clone());
            device.manufacturer = device_cfg.manufacturer.clone();
            device.model = device_cfg.model.clone();
            engine.devices.insert(device.id.clone(), device);
        }

        let mut state = State::default();
        for entity_cfg in &cfg.entities {
            let entity_id = &entity_cfg.entity_id;
            if !valid_entity_id(entity_id) {
                return Err(ConfigError::InvalidEntityId(entity_id.clone()));
            }
            if engine.entities.contains_key(entity_id) {
                return Err(ConfigError::DuplicateEntity(entity_id.clone()));
            }

            if let Some(device_id) = &entity_cfg.device {
                let device = engine.devices.get_mut(device_id).ok_or_else(|| {
                    ConfigError::UnknownDevice {
                        entity_id: entity_id.clone(),
                        device_id: device_id.clone(),
                    }
                })?;
                device.add_entity(entity_id.clone());
            }

            let entry = RegistryEntry::new(entity_id, entity_cfg.device.clone())
                .ok_or_else(|| ConfigError::InvalidEntityId(entity_id.clone()))?;
            engine.entities.insert(
                entity_id.clone(),
                EntityRecord {
                    entry,
                    device_class: entity_cfg.device_class.clone(),
                    unit_of_measurement: entity_cfg.unit_of_measurement.clone(),
                },
            );

            if let Some(value) = &entity_cfg.state {
                state
                    .sensors
                    .insert(entity_id.clone(), SensorState::new(value.clone()));
            }
        }

        info!(
            "Engine loaded {} device(s), {} entity(ies)",
            engine.devices.len(),
            engine.entities.len()
        );

        engine.state = ArcSwap::from_pointee(state);
        Ok(engine)
    }

    /// Look up a device by ID
    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    /// Get a snapshot of the current engine state.
    ///
    /// Clones the `Arc`, the state itself is not copied.
    pub fn state_snapshot(&self) -> Arc<State> {
        self.state.load_full()
    }

    /// Record a new state value for an entity
    pub fn set_state(&self, entity_id: &str, value: impl Into<String>) {
        let sensor_state = SensorState::new(value);
        debug!("State changed: {} -> {}", entity_id, sensor_state.value);

        self.state.rcu(|current| {
            let mut state = State::clone(current);
            state
                .sensors
                .insert(entity_id.to_string(), sensor_state.clone());
            state
        });
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for Engine {
    async fn entries_for_device(&self, device_id: &str) -> Vec<RegistryEntry> {
        let Some(device) = self.devices.get(device_id) else {
            debug!("Unknown device: {}", device_id);
            return Vec::new();
        };

        device
            .entity_ids
            .iter()
            .filter_map(|entity_id| self.entities.get(entity_id))
            .map(|record| record.entry.clone())
            .collect()
    }

    fn device_class(&self, entity_id: &str) -> Option<String> {
        self.entities
            .get(entity_id)
            .and_then(|record| record.device_class.clone())
    }

    fn unit_of_measurement(&self, entity_id: &str) -> Result<Option<String>, HostError> {
        self.entities
            .get(entity_id)
            .map(|record| record.unit_of_measurement.clone())
            .ok_or_else(|| HostError::EntityNotFound(entity_id.to_string()))
    }

    fn validate_numeric_state(
        &self,
        config: NumericStateConfig,
    ) -> Result<NumericStateConfig, HostError> {
        condition::validate_numeric_state(&config)?;
        Ok(config)
    }

    fn normalize_numeric_state(
        &self,
        config: NumericStateConfig,
    ) -> Result<NumericStateConfig, HostError> {
        // Unknown entities are allowed, their checks fail until state for them appears
        if !self.entities.contains_key(&config.entity_id) {
            warn!(
                "numeric_state condition references unknown entity {}",
                config.entity_id
            );
        }
        Ok(config)
    }

    fn numeric_state_from_config(
        &self,
        config: NumericStateConfig,
    ) -> Result<ConditionChecker, HostError> {
        Ok(condition::numeric_state_checker(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [[devices]]
        id = "climate_sensor"
        name = "Living Room Climate"
        model = "WSDCGQ11LM"

        [[devices]]
        id = "empty"
        name = "Nothing Attached"

        [[entities]]
        entity_id = "sensor.living_room_temperature"
        device = "climate_sensor"
        device_class = "temperature"
        unit_of_measurement = "°C"
        state = "21.5"

        [[entities]]
        entity_id = "sensor.living_room_humidity"
        device = "climate_sensor"
        device_class = "humidity"
        unit_of_measurement = "%"

        [[entities]]
        entity_id = "sun.sun"
    "#;

    fn engine() -> Engine {
        Engine::from_config(&CONFIG.parse().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_entries_in_config_order() {
        let engine = engine();
        let entries = engine.entries_for_device("climate_sensor").await;
        let ids: Vec<&str> = entries.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["sensor.living_room_temperature", "sensor.living_room_humidity"]
        );
        assert!(entries.iter().all(|e| e.domain == "sensor"));

        assert!(engine.entries_for_device("empty").await.is_empty());
        assert!(engine.entries_for_device("missing").await.is_empty());
    }

    #[test]
    fn test_metadata_lookups() {
        let engine = engine();
        assert_eq!(
            engine.device_class("sensor.living_room_humidity").as_deref(),
            Some("humidity")
        );
        assert_eq!(engine.device_class("sun.sun"), None);
        assert_eq!(
            engine
                .unit_of_measurement("sensor.living_room_temperature")
                .unwrap()
                .as_deref(),
            Some("°C")
        );
        assert_eq!(engine.unit_of_measurement("sun.sun").unwrap(), None);
        assert!(matches!(
            engine.unit_of_measurement("sensor.unknown"),
            Err(HostError::EntityNotFound(_))
        ));
        assert_eq!(
            engine.device("climate_sensor").unwrap().model.as_deref(),
            Some("WSDCGQ11LM")
        );
    }

    #[test]
    fn test_state_updates_replace_snapshot() {
        let engine = engine();
        let before = engine.state_snapshot();
        assert_eq!(
            before.sensor("sensor.living_room_temperature"),
            Some(&SensorState::new("21.5"))
        );
        assert!(before.sensor("sensor.living_room_humidity").is_none());

        engine.set_state("sensor.living_room_humidity", "48");

        let after = engine.state_snapshot();
        assert_eq!(
            after.sensor("sensor.living_room_humidity"),
            Some(&SensorState::new("48"))
        );
        // Old snapshots are unaffected
        assert!(before.sensor("sensor.living_room_humidity").is_none());
    }

    #[test]
    fn test_concurrent_state_updates_are_all_kept() {
        let engine = engine();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let engine = &engine;
                scope.spawn(move || {
                    engine.set_state(&format!("sensor.worker_{}", i), i.to_string());
                });
            }
        });

        let state = engine.state_snapshot();
        for i in 0..8 {
            assert_eq!(
                state.sensor(&format!("sensor.worker_{}", i)),
                Some(&SensorState::new(i.to_string()))
            );
        }
        assert_eq!(
            state.sensor("sensor.living_room_temperature"),
            Some(&SensorState::new("21.5"))
        );
    }

    #[test]
    fn test_normalize_keeps_unknown_entities() {
        let engine = engine();
        let mut config = NumericStateConfig::new("sensor.garden_temperature");
        config.below = Some(5.0);

        let normalized = engine.normalize_numeric_state(config.clone()).unwrap();
        assert_eq!(normalized, config);

        let check = engine.numeric_state_from_config(normalized).unwrap();
        assert!(!check(&engine.state_snapshot()));
        engine.set_state("sensor.garden_temperature", "2");
        assert!(check(&engine.state_snapshot()));
    }

    #[test]
    fn test_numeric_state_pipeline() {
        let engine = engine();
        let mut config = NumericStateConfig::new("Sensor.Living_Room_Temperature");
        config.above = Some(20.0);
        assert!(
            engine.validate_numeric_state(config).is_err(),
            "upper-case entity ids fail the schema"
        );

        let mut config = NumericStateConfig::new("sensor.living_room_temperature");
        config.above = Some(20.0);
        let config = engine.validate_numeric_state(config).unwrap();
        let config = engine.normalize_numeric_state(config).unwrap();
        let check = engine.numeric_state_from_config(config).unwrap();

        assert!(check(&engine.state_snapshot()));
        engine.set_state("sensor.living_room_temperature", "19");
        assert!(!check(&engine.state_snapshot()));
    }

    #[test]
    fn test_unknown_device_rejected() {
        let config: Config = r#"
            [[entities]]
            entity_id = "sensor.orphan"
            device = "nowhere"
        "#
        .parse()
        .unwrap();

        assert!(matches!(
            Engine::from_config(&config),
            Err(ConfigError::UnknownDevice { .. })
        ));
    }

    #[test]
    fn test_invalid_and_duplicate_entities_rejected() {
        let config: Config = r#"
            [[entities]]
            entity_id = "Living Room"
        "#
        .parse()
        .unwrap();
        assert!(matches!(
            Engine::from_config(&config),
            Err(ConfigError::InvalidEntityId(_))
        ));

        let config: Config = r#"
            [[entities]]
            entity_id = "sensor.a"

            [[entities]]
            entity_id = "sensor.a"
        "#
        .parse()
        .unwrap();
        assert!(matches!(
            Engine::from_config(&config),
            Err(ConfigError::DuplicateEntity(_))
        ));
    }
}
