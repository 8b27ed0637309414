//! Device automation: conditions offered by the entities of a device.
//!
//! Each entity domain that supports device conditions provides a [`ConditionPlatform`] and
//! registers it in [`CONDITION_PLATFORMS`]. The functions in this module fan requests out to the
//! platforms, either all of them (listing a device's conditions) or the one named by the `domain`
//! key of a condition config.

mod error;
pub mod schema;

use async_trait::async_trait;
use linkme::distributed_slice;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub use error::DeviceAutomationError;

use crate::condition::ConditionChecker;
use crate::condition::ConditionKind;
use crate::host::Host;

/// A condition the UI can offer for one entity of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionDescriptor {
    pub condition: ConditionKind,
    pub device_id: String,
    pub entity_id: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub condition_type: String,
}

/// Extra fields a condition accepts beyond the ones in its descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capabilities {
    pub extra_fields: Vec<ExtraField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraField {
    pub name: String,
    pub optional: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<FieldDescription>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Float,
}

/// Presentation hints for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescription {
    pub suffix: String,
}

/// Device conditions for a single entity domain.
#[async_trait]
pub trait ConditionPlatform: Send + Sync {
    /// Entity domain this platform handles (e.g. "sensor")
    fn domain(&self) -> &'static str;

    /// List the conditions offered by this domain's entities on a device.
    async fn async_get_conditions(
        &self,
        host: &dyn Host,
        device_id: &str,
    ) -> Vec<ConditionDescriptor>;

    /// Validate a raw condition config.
    fn validate_condition_config(&self, config: &Value) -> Result<(), DeviceAutomationError>;

    /// Validate a raw condition config and compile it into a check.
    fn condition_from_config(
        &self,
        host: &dyn Host,
        config: &Value,
    ) -> Result<ConditionChecker, DeviceAutomationError>;

    /// Describe the extra fields a condition accepts.
    async fn async_get_condition_capabilities(
        &self,
        host: &dyn Host,
        config: &Value,
    ) -> Result<Capabilities, DeviceAutomationError>;
}

#[distributed_slice]
pub static CONDITION_PLATFORMS: [fn() -> Box<dyn ConditionPlatform>];

/// Find the platform registered for a domain.
pub fn platform_for(domain: &str) -> Result<Box<dyn ConditionPlatform>, DeviceAutomationError> {
    CONDITION_PLATFORMS
        .iter()
        .map(|constr| constr())
        .find(|platform| platform.domain() == domain)
        .ok_or_else(|| {
            DeviceAutomationError::InvalidConfig(format!(
                "Domain '{}' does not provide device conditions",
                domain
            ))
        })
}

/// Find the platform named by the `domain` key of a condition config.
fn platform_for_config(config: &Value) -> Result<Box<dyn ConditionPlatform>, DeviceAutomationError> {
    let domain = config
        .get(schema::CONF_DOMAIN)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            DeviceAutomationError::InvalidConfig("Condition config has no domain".to_string())
        })?;
    platform_for(domain)
}

/// List every condition offered by a device, across all platforms.
pub async fn async_get_device_conditions(
    host: &dyn Host,
    device_id: &str,
) -> Vec<ConditionDescriptor> {
    let mut conditions = Vec::new();
    for constr in CONDITION_PLATFORMS {
        let platform = constr();
        let found = platform.async_get_conditions(host, device_id).await;
        debug!(
            "{} condition(s) from '{}' for device {}",
            found.len(),
            platform.domain(),
            device_id
        );
        conditions.extend(found);
    }
    conditions
}

/// Validate a raw condition config against the schema of its domain.
pub fn async_validate_condition_config(config: &Value) -> Result<(), DeviceAutomationError> {
    platform_for_config(config)?.validate_condition_config(config)
}

/// Validate and compile a raw condition config.
pub fn condition_from_config(
    host: &dyn Host,
    config: &Value,
) -> Result<ConditionChecker, DeviceAutomationError> {
    platform_for_config(config)?.condition_from_config(host, config)
}

/// Describe the extra fields a raw condition config accepts.
pub async fn async_get_condition_capabilities(
    host: &dyn Host,
    config: &Value,
) -> Result<Capabilities, DeviceAutomationError> {
    platform_for_config(config)?
        .async_get_condition_capabilities(host, config)
        .await
}
