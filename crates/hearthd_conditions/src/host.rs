//! Collaborator interface onto the host platform.
//!
//! Device automation code never talks to registries or the state machine directly. Everything it
//! needs is looked up through [`Host`], so it can run against the bundled [`Engine`] or a mock.
//!
//! [`Engine`]: crate::engine::Engine

use async_trait::async_trait;

use crate::condition::ConditionChecker;
use crate::condition::NumericStateConfig;
use crate::engine::entity::RegistryEntry;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Invalid numeric_state condition: {0}")]
    InvalidNumericState(String),
}

/// Lookups and factories provided by the host.
#[async_trait]
pub trait Host: Send + Sync {
    /// Registry entries belonging to a device, in registry order.
    async fn entries_for_device(&self, device_id: &str) -> Vec<RegistryEntry>;

    /// Raw device class of an entity, if it has one.
    fn device_class(&self, entity_id: &str) -> Option<String>;

    /// Unit of measurement of an entity.
    ///
    /// Fails if the host does not know the entity at all.
    fn unit_of_measurement(&self, entity_id: &str) -> Result<Option<String>, HostError>;

    /// Validate a numeric-state config against the host's schema.
    fn validate_numeric_state(
        &self,
        config: NumericStateConfig,
    ) -> Result<NumericStateConfig, HostError>;

    /// Normalize a validated numeric-state config (e.g. resolve entity references).
    fn normalize_numeric_state(
        &self,
        config: NumericStateConfig,
    ) -> Result<NumericStateConfig, HostError>;

    /// Build an executable check from a normalized numeric-state config.
    fn numeric_state_from_config(
        &self,
        config: NumericStateConfig,
    ) -> Result<ConditionChecker, HostError>;
}

/// Mock host for testing
#[cfg(test)]
#[derive(Default)]
pub struct MockHost {
    pub entries: Vec<RegistryEntry>,
    pub device_classes: std::collections::HashMap<String, String>,
    pub units: std::collections::HashMap<String, String>,
    /// Entities the host does not know; unit lookups for these fail.
    pub unknown: Vec<String>,
    /// Every numeric-state config that reached the host, tagged with the step that saw it.
    pub numeric_calls: std::sync::Mutex<Vec<(&'static str, NumericStateConfig)>>,
}

#[cfg(test)]
impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity to the registry with optional device class and unit.
    pub fn add_entity(
        &mut self,
        device_id: &str,
        entity_id: &str,
        device_class: Option<&str>,
        unit: Option<&str>,
    ) {
        let entry = RegistryEntry::new(entity_id, Some(device_id.to_string()))
            .expect("test entity ids are valid");
        self.entries.push(entry);
        if let Some(class) = device_class {
            self.device_classes
                .insert(entity_id.to_string(), class.to_string());
        }
        if let Some(unit) = unit {
            self.units.insert(entity_id.to_string(), unit.to_string());
        }
    }

    fn record(&self, step: &'static str, config: &NumericStateConfig) {
        self.numeric_calls
            .lock()
            .unwrap()
            .push((step, config.clone()));
    }
}

#[cfg(test)]
#[async_trait]
impl Host for MockHost {
    async fn entries_for_device(&self, device_id: &str) -> Vec<RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| e.device_id.as_deref() == Some(device_id))
            .cloned()
            .collect()
    }

    fn device_class(&self, entity_id: &str) -> Option<String> {
        self.device_classes.get(entity_id).cloned()
    }

    fn unit_of_measurement(&self, entity_id: &str) -> Result<Option<String>, HostError> {
        if self.unknown.iter().any(|e| e == entity_id) {
            return Err(HostError::EntityNotFound(entity_id.to_string()));
        }
        Ok(self.units.get(entity_id).cloned())
    }

    fn validate_numeric_state(
        &self,
        config: NumericStateConfig,
    ) -> Result<NumericStateConfig, HostError> {
        self.record("validate", &config);
        crate::condition::validate_numeric_state(&config)?;
        Ok(config)
    }

    fn normalize_numeric_state(
        &self,
        config: NumericStateConfig,
    ) -> Result<NumericStateConfig, HostError> {
        self.record("normalize", &config);
        Ok(config)
    }

    fn numeric_state_from_config(
        &self,
        config: NumericStateConfig,
    ) -> Result<ConditionChecker, HostError> {
        self.record("from_config", &config);
        Ok(crate::condition::numeric_state_checker(config))
    }
}
