use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// State of a sensor entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorState {
    /// Raw state value as reported by the integration (e.g. "21.5", "unavailable").
    pub value: String,
}

impl SensorState {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Parse the state as a number. `None` for non-numeric states such as "unknown".
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// Centralized snapshot of the entity states known to the engine.
///
/// Condition checkers are evaluated against a snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub sensors: HashMap<String, SensorState>,
}

impl State {
    pub fn sensor(&self, entity_id: &str) -> Option<&SensorState> {
        self.sensors.get(entity_id)
    }
}
