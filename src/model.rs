use num_derive::FromPrimitive;
use serde::Deserialize;
use serde_json::Value;

type KWh = f64;

pub type UnsupportedDeviceTypeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum SupportedDeviceTypeId {
    StringInverter = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceTypeId {
    UnsupportedDeviceTypeId(UnsupportedDeviceTypeId),
    SupportedDeviceTypeId(SupportedDeviceTypeId),
}

impl DeviceTypeId {
    /// Numeric id as sent in `devTypeId`.
    pub fn as_u64(&self) -> u64 {
        match *self {
            DeviceTypeId::SupportedDeviceTypeId(v) => v as u64,
            DeviceTypeId::UnsupportedDeviceTypeId(v) => v,
        }
    }
}

impl From<u64> for DeviceTypeId {
    fn from(v: u64) -> Self {
        match num::FromPrimitive::from_u64(v) {
            Some(supported) => DeviceTypeId::SupportedDeviceTypeId(supported),
            None => DeviceTypeId::UnsupportedDeviceTypeId(v),
        }
    }
}

impl<'de> serde::Deserialize<'de> for DeviceTypeId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;

        Value::as_u64(&value)
            .ok_or_else(|| serde::de::Error::missing_field("devTypeId"))
            .map(DeviceTypeId::from)
    }
}

/// Command codes accepted by `devOnOff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    PowerOn = 1,
    PowerOff = 2,
}

impl From<ControlType> for u32 {
    fn from(control: ControlType) -> u32 {
        control as u32
    }
}

/// Northbound account. `system_code` is the password FusionSolar issues for API users.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub system_code: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, system_code: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            system_code: system_code.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("system_code", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Station {
    pub capacity: KWh,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Device {
    pub type_id: DeviceTypeId,
    pub id: u64,
    pub name: String,
}

#[derive(Debug)]
pub struct StationRealKpi {
    pub code: String,
    pub day_power: KWh,
}

#[derive(Debug)]
pub struct DeviceRealKpi {
    pub id: u64,
    pub temperature: Option<f64>,
    pub active_power: Option<f64>,
}
