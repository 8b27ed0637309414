//! Sensor entities: numeric measurements of a physical quantity.

pub mod device_condition;

use serde::Deserialize;
use serde::Serialize;

pub const DOMAIN: &str = "sensor";

/// Device class for sensors, matching Home Assistant's sensor device classes.
///
/// The device class says which physical quantity a sensor measures.
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
pub enum SensorDeviceClass {
    ApparentPower,
    Aqi,
    Battery,
    CarbonDioxide,
    CarbonMonoxide,
    Current,
    Date,
    Energy,
    Frequency,
    Gas,
    Humidity,
    Illuminance,
    Monetary,
    NitrogenDioxide,
    NitrogenMonoxide,
    NitrousOxide,
    Ozone,
    #[serde(rename = "pm1")]
    #[strum(serialize = "pm1")]
    Pm1,
    #[serde(rename = "pm10")]
    #[strum(serialize = "pm10")]
    Pm10,
    #[serde(rename = "pm25")]
    #[strum(serialize = "pm25")]
    Pm25,
    Power,
    PowerFactor,
    Pressure,
    ReactivePower,
    SignalStrength,
    SulphurDioxide,
    Temperature,
    Timestamp,
    VolatileOrganicCompounds,
    Voltage,
}
