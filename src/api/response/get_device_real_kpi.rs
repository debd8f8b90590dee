use crate::api::Error;
use crate::model::{DeviceTypeId, SupportedDeviceTypeId};
use serde::Deserialize;
use serde_json::Value;

/* Device Type 1: String Inverter */
pub mod string_inverter {
    use serde::Deserialize;

    /// Inverters report `null` for most values while offline.
    #[derive(Deserialize)]
    pub struct DataItemMap {
        #[serde(default)]
        pub temperature: Option<f64>,
        #[serde(default)]
        pub active_power: Option<f64>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Data {
        pub dev_id: u64,
        pub data_item_map: DataItemMap,
    }
}

pub enum GetDeviceRealKpi {
    StringInverter(Vec<string_inverter::Data>),
}

impl GetDeviceRealKpi {
    /// The `data` payload carries no type information, so the caller supplies the type it asked
    /// for in `devTypeId`.
    pub fn from_data(type_id: DeviceTypeId, data: Value) -> Result<Self, Error> {
        match type_id {
            DeviceTypeId::SupportedDeviceTypeId(SupportedDeviceTypeId::StringInverter) => {
                Vec::<string_inverter::Data>::deserialize(data)
                    .map(GetDeviceRealKpi::StringInverter)
                    .map_err(|e| Error::UnexpectedApiResponse(e.to_string()))
            }
            DeviceTypeId::UnsupportedDeviceTypeId(id) => Err(Error::UnknownDeviceType(id)),
        }
    }
}
