//! Generic condition shapes understood by the host.
//!
//! Device conditions are translated into one of these before they can be evaluated. Only the
//! numeric-state condition is modelled; it compares an entity's numeric state against optional
//! lower (`above`) and upper (`below`) bounds.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

use crate::engine::State;
use crate::engine::entity::valid_entity_id;
use crate::host::HostError;

/// The `condition` tag of a condition config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionKind {
    Device,
    NumericState,
}

/// An executable condition check. Returns whether the condition holds for a state snapshot.
pub type ConditionChecker = Box<dyn Fn(&State) -> bool + Send + Sync>;

/// Config for a numeric-state condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStateConfig {
    pub condition: ConditionKind,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
}

impl NumericStateConfig {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            condition: ConditionKind::NumericState,
            entity_id: entity_id.into(),
            above: None,
            below: None,
        }
    }
}

/// Check a numeric-state config against its schema.
///
/// The condition tag must be `numeric_state`, the entity id must be well formed and at least one
/// of the bounds must be present.
pub fn validate_numeric_state(config: &NumericStateConfig) -> Result<(), HostError> {
    if config.condition != ConditionKind::NumericState {
        return Err(HostError::InvalidNumericState(format!(
            "expected condition 'numeric_state', found '{}'",
            config.condition
        )));
    }

    if !valid_entity_id(&config.entity_id) {
        return Err(HostError::InvalidNumericState(format!(
            "invalid entity id '{}'",
            config.entity_id
        )));
    }

    if config.above.is_none() && config.below.is_none() {
        return Err(HostError::InvalidNumericState(
            "must contain at least one of below, above.".to_string(),
        ));
    }

    Ok(())
}

/// Build a checker for a numeric-state config.
///
/// The state must parse as a number strictly above `above` and strictly below `below`, for
/// whichever bounds are set. Missing or non-numeric states never match.
pub fn numeric_state_checker(config: NumericStateConfig) -> ConditionChecker {
    Box::new(move |state: &State| {
        let Some(sensor) = state.sensor(&config.entity_id) else {
            trace!("{}: no state, condition fails", config.entity_id);
            return false;
        };

        let Some(value) = sensor.numeric_value() else {
            trace!(
                "{}: state '{}' is not numeric, condition fails",
                config.entity_id,
                sensor.value
            );
            return false;
        };

        // NaN on either side compares as unordered and fails
        if let Some(above) = config.above {
            if value.partial_cmp(&above) != Some(Ordering::Greater) {
                return false;
            }
        }

        if let Some(below) = config.below {
            if value.partial_cmp(&below) != Some(Ordering::Less) {
                return false;
            }
        }

        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SensorState;

    fn state_with(entity_id: &str, value: &str) -> State {
        let mut state = State::default();
        state
            .sensors
            .insert(entity_id.to_string(), SensorState::new(value));
        state
    }

    #[test]
    fn test_numeric_state_serializes_present_bounds_only() {
        let mut config = NumericStateConfig::new("sensor.temperature");
        config.above = Some(18.0);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "condition": "numeric_state",
                "entity_id": "sensor.temperature",
                "above": 18.0,
            })
        );
    }

    #[test]
    fn test_validate_requires_a_bound() {
        let config = NumericStateConfig::new("sensor.temperature");
        let err = validate_numeric_state(&config).unwrap_err();
        assert!(err.to_string().contains("at least one of below, above"));
    }

    #[test]
    fn test_validate_rejects_wrong_kind() {
        let mut config = NumericStateConfig::new("sensor.temperature");
        config.condition = ConditionKind::Device;
        config.below = Some(3.0);
        assert!(validate_numeric_state(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_entity_id() {
        let mut config = NumericStateConfig::new("Temperature");
        config.below = Some(3.0);
        assert!(validate_numeric_state(&config).is_err());
    }

    #[test]
    fn test_checker_bounds_are_exclusive() {
        let mut config = NumericStateConfig::new("sensor.temperature");
        config.above = Some(18.0);
        config.below = Some(25.0);
        let check = numeric_state_checker(config);

        assert!(check(&state_with("sensor.temperature", "21.5")));
        assert!(!check(&state_with("sensor.temperature", "18")));
        assert!(!check(&state_with("sensor.temperature", "25")));
        assert!(!check(&state_with("sensor.temperature", "30.1")));
    }

    #[test]
    fn test_checker_single_bound() {
        let mut config = NumericStateConfig::new("sensor.battery");
        config.below = Some(20.0);
        let check = numeric_state_checker(config);

        assert!(check(&state_with("sensor.battery", "5")));
        assert!(check(&state_with("sensor.battery", "-40")));
        assert!(!check(&state_with("sensor.battery", "95")));
    }

    #[test]
    fn test_checker_missing_or_non_numeric_state() {
        let mut config = NumericStateConfig::new("sensor.power");
        config.above = Some(0.0);
        let check = numeric_state_checker(config);

        assert!(!check(&State::default()));
        assert!(!check(&state_with("sensor.power", "unavailable")));
    }

    #[test]
    fn test_checker_nan_state_never_matches() {
        let mut config = NumericStateConfig::new("sensor.temperature");
        config.above = Some(18.0);
        config.below = Some(25.0);
        let check = numeric_state_checker(config);

        assert!(!check(&state_with("sensor.temperature", "nan")));
        assert!(!check(&state_with("sensor.temperature", "NaN")));
    }

    #[test]
    fn test_checker_nan_bound_never_matches() {
        let mut above = NumericStateConfig::new("sensor.temperature");
        above.above = Some(f64::NAN);
        let check = numeric_state_checker(above);
        assert!(!check(&state_with("sensor.temperature", "-1000")));
        assert!(!check(&state_with("sensor.temperature", "1000")));

        let mut below = NumericStateConfig::new("sensor.temperature");
        below.below = Some(f64::NAN);
        let check = numeric_state_checker(below);
        assert!(!check(&state_with("sensor.temperature", "-1000")));
    }
}
