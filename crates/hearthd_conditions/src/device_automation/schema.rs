//! Field-by-field reading of raw condition configs.
//!
//! [`ConfigReader`] walks a JSON object, coercing and checking each field the platform asks for.
//! Problems are collected rather than returned one at a time so a user sees all of them at once.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde_json::Map;
use serde_json::Value;
use strum::IntoEnumIterator;

use super::DeviceAutomationError;
use crate::diagnostics::ValidationError;
use crate::engine::entity::valid_entity_id;

pub const CONF_CONDITION: &str = "condition";
pub const CONF_DEVICE_ID: &str = "device_id";
pub const CONF_DOMAIN: &str = "domain";
pub const CONF_ENTITY_ID: &str = "entity_id";
pub const CONF_TYPE: &str = "type";
pub const CONF_ABOVE: &str = "above";
pub const CONF_BELOW: &str = "below";

/// Keys the UI attaches to stored configs; dropped without complaint.
const CONF_METADATA: &str = "metadata";

/// Fields shared by every device condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConditionBase {
    pub device_id: String,
    pub domain: String,
}

pub struct ConfigReader<'a> {
    object: &'a Map<String, Value>,
    read: BTreeSet<&'static str>,
    errors: Vec<ValidationError>,
}

impl<'a> ConfigReader<'a> {
    pub fn new(config: &'a Value) -> Result<Self, DeviceAutomationError> {
        let object = config.as_object().ok_or_else(|| {
            DeviceAutomationError::Schema(vec![ValidationError::new("", "expected a dictionary")])
        })?;

        Ok(Self {
            object,
            read: BTreeSet::new(),
            errors: Vec::new(),
        })
    }

    pub fn error(&mut self, field_path: &str, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field_path, message));
    }

    fn get(&mut self, key: &'static str) -> Option<&'a Value> {
        self.read.insert(key);
        self.object.get(key)
    }

    fn required(&mut self, key: &'static str) -> Option<&'a Value> {
        let value = self.get(key);
        if value.is_none() {
            self.error(key, "required key not provided");
        }
        value
    }

    pub fn required_string(&mut self, key: &'static str) -> Option<String> {
        match self.required(key)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.error(key, "expected str");
                None
            }
        }
    }

    /// A key whose value must be exactly `expected`.
    pub fn literal(&mut self, key: &'static str, expected: &str) {
        if let Some(value) = self.required_string(key) {
            if value != expected {
                self.error(key, format!("value must be {}", expected));
            }
        }
    }

    /// An entity id, lower-cased before it is checked.
    pub fn required_entity_id(&mut self, key: &'static str) -> Option<String> {
        let entity_id = self.required_string(key)?.to_lowercase();
        if valid_entity_id(&entity_id) {
            Some(entity_id)
        } else {
            self.error(key, format!("Entity ID {} is an invalid entity ID", entity_id));
            None
        }
    }

    /// A string that must name one variant of a closed enum.
    pub fn required_choice<T>(&mut self, key: &'static str) -> Option<T>
    where
        T: IntoEnumIterator + FromStr + Into<&'static str>,
    {
        let value = self.required_string(key)?;
        match value.parse() {
            Ok(choice) => Some(choice),
            Err(_) => {
                let choices: Vec<&'static str> = T::iter().map(Into::into).collect();
                self.error(
                    key,
                    format!("value must be one of [{}]", choices.join(", ")),
                );
                None
            }
        }
    }

    /// An optional number; numeric strings are coerced.
    pub fn optional_float(&mut self, key: &'static str) -> Option<f64> {
        let coerced = match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        if coerced.is_none() {
            self.error(key, "expected float");
        }
        coerced
    }

    /// Read the fields every device condition carries.
    pub fn device_condition_base(&mut self) -> Option<DeviceConditionBase> {
        self.literal(CONF_CONDITION, "device");
        let device_id = self.required_string(CONF_DEVICE_ID);
        let domain = self.required_string(CONF_DOMAIN);
        Some(DeviceConditionBase {
            device_id: device_id?,
            domain: domain?,
        })
    }

    /// Reject keys nobody asked for and return everything collected.
    pub fn finish(self) -> Result<(), DeviceAutomationError> {
        self.finish_with(Some(()))
    }

    /// Like [`finish`](Self::finish), handing back the fields read from the config.
    ///
    /// Every reader method that returns `None` has recorded an error, so `fields` is only `None`
    /// when the config is rejected anyway.
    pub fn finish_with<T>(mut self, fields: Option<T>) -> Result<T, DeviceAutomationError> {
        let extra: Vec<&String> = self
            .object
            .keys()
            .filter(|k| k.as_str() != CONF_METADATA && !self.read.contains(k.as_str()))
            .collect();
        for key in extra {
            self.errors
                .push(ValidationError::new(key.as_str(), "extra keys not allowed"));
        }

        match fields {
            Some(fields) if self.errors.is_empty() => Ok(fields),
            _ => Err(DeviceAutomationError::Schema(self.errors)),
        }
    }
}
