//! Device conditions for sensors.
//!
//! A sensor with a unit of measurement offers one or more "is_<quantity>" conditions depending on
//! its device class. Such a condition is a thin wrapper around a numeric-state condition on the
//! sensor's value, with the bounds shown in the sensor's unit.

use async_trait::async_trait;
use linkme::distributed_slice;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::DOMAIN;
use super::SensorDeviceClass;
use crate::condition::ConditionChecker;
use crate::condition::ConditionKind;
use crate::condition::NumericStateConfig;
use crate::device_automation::Capabilities;
use crate::device_automation::CONDITION_PLATFORMS;
use crate::device_automation::ConditionDescriptor;
use crate::device_automation::ConditionPlatform;
use crate::device_automation::DeviceAutomationError;
use crate::device_automation::ExtraField;
use crate::device_automation::FieldDescription;
use crate::device_automation::FieldType;
use crate::device_automation::schema::ConfigReader;
use crate::device_automation::schema::CONF_ABOVE;
use crate::device_automation::schema::CONF_BELOW;
use crate::device_automation::schema::CONF_ENTITY_ID;
use crate::device_automation::schema::CONF_TYPE;
use crate::diagnostics::ValidationError;
use crate::host::Host;

/// Condition types offered by sensors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionType {
    IsApparentPower,
    IsBatteryLevel,
    IsCarbonMonoxide,
    IsCarbonDioxide,
    IsCurrent,
    IsEnergy,
    IsFrequency,
    IsGas,
    IsHumidity,
    IsIlluminance,
    IsNitrogenDioxide,
    IsNitrogenMonoxide,
    IsNitrousOxide,
    IsOzone,
    #[serde(rename = "is_pm1")]
    #[strum(serialize = "is_pm1")]
    IsPm1,
    #[serde(rename = "is_pm10")]
    #[strum(serialize = "is_pm10")]
    IsPm10,
    #[serde(rename = "is_pm25")]
    #[strum(serialize = "is_pm25")]
    IsPm25,
    IsPower,
    IsPowerFactor,
    IsPressure,
    IsReactivePower,
    IsSignalStrength,
    IsSulphurDioxide,
    IsTemperature,
    IsVolatileOrganicCompounds,
    IsVoltage,
    IsValue,
}

/// What a sensor measures, as far as condition templates are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    DeviceClass(SensorDeviceClass),
    /// No device class, or one this crate does not recognize.
    Unclassified,
}

impl Classification {
    /// Classify a raw device class string.
    pub fn from_device_class(device_class: Option<&str>) -> Self {
        match device_class.map(str::parse::<SensorDeviceClass>) {
            Some(Ok(class)) => Self::DeviceClass(class),
            Some(Err(_)) => {
                debug!("Unrecognized sensor device class: {:?}", device_class);
                Self::Unclassified
            }
            None => Self::Unclassified,
        }
    }
}

/// Condition types offered for each classification.
pub const fn entity_conditions(classification: Classification) -> &'static [ConditionType] {
    use ConditionType::*;
    use SensorDeviceClass as Class;

    let class = match classification {
        Classification::DeviceClass(class) => class,
        Classification::Unclassified => return &[IsValue],
    };

    match class {
        Class::ApparentPower => &[IsApparentPower],
        Class::Battery => &[IsBatteryLevel],
        Class::CarbonMonoxide => &[IsCarbonMonoxide],
        Class::CarbonDioxide => &[IsCarbonDioxide],
        Class::Current => &[IsCurrent],
        Class::Energy => &[IsEnergy],
        Class::Frequency => &[IsFrequency],
        Class::Gas => &[IsGas],
        Class::Humidity => &[IsHumidity],
        Class::Illuminance => &[IsIlluminance],
        Class::NitrogenDioxide => &[IsNitrogenDioxide],
        Class::NitrogenMonoxide => &[IsNitrogenMonoxide],
        Class::NitrousOxide => &[IsNitrousOxide],
        Class::Ozone => &[IsOzone],
        Class::Pm1 => &[IsPm1],
        Class::Pm10 => &[IsPm10],
        Class::Pm25 => &[IsPm25],
        Class::Power => &[IsPower],
        Class::PowerFactor => &[IsPowerFactor],
        Class::Pressure => &[IsPressure],
        Class::ReactivePower => &[IsReactivePower],
        Class::SignalStrength => &[IsSignalStrength],
        Class::SulphurDioxide => &[IsSulphurDioxide],
        Class::Temperature => &[IsTemperature],
        Class::VolatileOrganicCompounds => &[IsVolatileOrganicCompounds],
        Class::Voltage => &[IsVoltage],
        Class::Aqi | Class::Date | Class::Monetary | Class::Timestamp => &[IsValue],
    }
}

/// Numeric bounds of a sensor condition. At least one bound is always present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    Above(f64),
    Below(f64),
    Between { above: f64, below: f64 },
}

impl Bounds {
    pub fn new(above: Option<f64>, below: Option<f64>) -> Option<Self> {
        match (above, below) {
            (Some(above), Some(below)) => Some(Self::Between { above, below }),
            (Some(above), None) => Some(Self::Above(above)),
            (None, Some(below)) => Some(Self::Below(below)),
            (None, None) => None,
        }
    }

    pub fn above(&self) -> Option<f64> {
        match *self {
            Self::Above(above) | Self::Between { above, .. } => Some(above),
            Self::Below(_) => None,
        }
    }

    pub fn below(&self) -> Option<f64> {
        match *self {
            Self::Below(below) | Self::Between { below, .. } => Some(below),
            Self::Above(_) => None,
        }
    }
}

/// A validated sensor condition config.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionConfig {
    pub device_id: String,
    pub entity_id: String,
    pub condition_type: ConditionType,
    pub bounds: Bounds,
}

impl ConditionConfig {
    /// The numeric-state config this condition stands for.
    pub fn to_numeric_state(&self) -> NumericStateConfig {
        NumericStateConfig {
            condition: ConditionKind::NumericState,
            entity_id: self.entity_id.clone(),
            above: self.bounds.above(),
            below: self.bounds.below(),
        }
    }
}

/// List the conditions offered by the sensors of a device.
///
/// Sensors without a unit of measurement offer nothing.
pub async fn async_get_conditions(host: &dyn Host, device_id: &str) -> Vec<ConditionDescriptor> {
    let entries = host.entries_for_device(device_id).await;

    let mut conditions = Vec::new();
    for entry in entries.iter().filter(|e| e.domain == DOMAIN) {
        let unit = match host.unit_of_measurement(&entry.entity_id) {
            Ok(Some(unit)) if !unit.is_empty() => unit,
            Ok(_) => {
                debug!("{}: no unit of measurement, skipping", entry.entity_id);
                continue;
            }
            Err(e) => {
                debug!("{}: {}, skipping", entry.entity_id, e);
                continue;
            }
        };

        let device_class = host.device_class(&entry.entity_id);
        let classification = Classification::from_device_class(device_class.as_deref());
        debug!(
            "{}: {:?} measured in {}",
            entry.entity_id, classification, unit
        );

        conditions.extend(entity_conditions(classification).iter().map(|condition_type| {
            ConditionDescriptor {
                condition: ConditionKind::Device,
                device_id: device_id.to_string(),
                entity_id: entry.entity_id.clone(),
                domain: DOMAIN.to_string(),
                condition_type: condition_type.to_string(),
            }
        }));
    }

    conditions
}

/// Validate a raw sensor condition config.
pub fn validate_condition_config(config: &Value) -> Result<ConditionConfig, DeviceAutomationError> {
    let mut reader = ConfigReader::new(config)?;
    let base = reader.device_condition_base();
    let entity_id = reader.required_entity_id(CONF_ENTITY_ID);
    let condition_type = reader.required_choice::<ConditionType>(CONF_TYPE);
    let below = reader.optional_float(CONF_BELOW);
    let above = reader.optional_float(CONF_ABOVE);
    let (base, entity_id, condition_type) = reader.finish_with(
        base.zip(entity_id)
            .zip(condition_type)
            .map(|((base, entity_id), condition_type)| (base, entity_id, condition_type)),
    )?;

    let bounds = Bounds::new(above, below).ok_or_else(|| {
        DeviceAutomationError::Schema(vec![ValidationError::new(
            "",
            format!("must contain at least one of {}, {}.", CONF_BELOW, CONF_ABOVE),
        )])
    })?;

    Ok(ConditionConfig {
        device_id: base.device_id,
        entity_id,
        condition_type,
        bounds,
    })
}

/// Compile a sensor condition into the host's numeric-state check.
pub fn condition_from_config(
    host: &dyn Host,
    config: &ConditionConfig,
) -> Result<ConditionChecker, DeviceAutomationError> {
    let numeric_state = host.validate_numeric_state(config.to_numeric_state())?;
    let numeric_state = host.normalize_numeric_state(numeric_state)?;
    Ok(host.numeric_state_from_config(numeric_state)?)
}

/// Describe the bounds a condition on `entity_id` accepts, in the entity's unit.
pub async fn async_get_condition_capabilities(
    host: &dyn Host,
    entity_id: &str,
) -> Result<Capabilities, DeviceAutomationError> {
    let unit = match host.unit_of_measurement(entity_id) {
        Ok(unit) => unit,
        Err(e) => {
            warn!("Unit of measurement lookup for {} failed: {}", entity_id, e);
            None
        }
    };

    let unit = unit.filter(|u| !u.is_empty()).ok_or_else(|| {
        DeviceAutomationError::InvalidConfig(format!(
            "No unit of measurement found for condition entity {}",
            entity_id
        ))
    })?;

    let bound = |name: &str| ExtraField {
        name: name.to_string(),
        optional: true,
        field_type: FieldType::Float,
        description: Some(FieldDescription {
            suffix: unit.clone(),
        }),
    };

    Ok(Capabilities {
        extra_fields: vec![bound(CONF_ABOVE), bound(CONF_BELOW)],
    })
}

/// Sensor entry in the device condition platform registry.
pub struct SensorConditions;

#[async_trait]
impl ConditionPlatform for SensorConditions {
    fn domain(&self) -> &'static str {
        DOMAIN
    }

    async fn async_get_conditions(
        &self,
        host: &dyn Host,
        device_id: &str,
    ) -> Vec<ConditionDescriptor> {
        async_get_conditions(host, device_id).await
    }

    fn validate_condition_config(&self, config: &Value) -> Result<(), DeviceAutomationError> {
        validate_condition_config(config).map(|_| ())
    }

    fn condition_from_config(
        &self,
        host: &dyn Host,
        config: &Value,
    ) -> Result<ConditionChecker, DeviceAutomationError> {
        let config = validate_condition_config(config)?;
        condition_from_config(host, &config)
    }

    async fn async_get_condition_capabilities(
        &self,
        host: &dyn Host,
        config: &Value,
    ) -> Result<Capabilities, DeviceAutomationError> {
        let entity_id = config
            .get(CONF_ENTITY_ID)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DeviceAutomationError::InvalidConfig(
                    "Condition config has no entity_id".to_string(),
                )
            })?;
        async_get_condition_capabilities(host, entity_id).await
    }
}

#[distributed_slice(CONDITION_PLATFORMS)]
fn sensor_conditions() -> Box<dyn ConditionPlatform> {
    Box::new(SensorConditions)
}
