//! Shapes of the `data` payload for the endpoints the typed helpers understand.

pub mod get_device_list;
pub mod get_device_real_kpi;
pub mod get_station_real_kpi;
pub mod get_stations_list;

use super::Error;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn parse<T: DeserializeOwned>(data: Value) -> Result<T, Error> {
    serde_json::from_value(data).map_err(|e| Error::UnexpectedApiResponse(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::get_device_real_kpi::GetDeviceRealKpi;
    use crate::api::envelope::Envelope;
    use crate::api::Error;
    use crate::model::DeviceTypeId;
    use serde_json::Value;
    use std::fs;
    use std::path::PathBuf;

    fn read_resource(filename: &str) -> String {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push(format!("resources/test/{}", filename));
        fs::read_to_string(d.as_path()).unwrap()
    }

    fn read_data(filename: &str) -> Value {
        Envelope::decode(&read_resource(filename))
            .and_then(Envelope::into_result)
            .unwrap()
    }

    #[test]
    fn get_stations_list() {
        let output: super::get_stations_list::GetStationsList =
            super::parse(read_data("getStationList.json")).unwrap();
        assert_eq!("StationCode", output[0].station_code);
        assert_eq!("StationName", output[0].station_name);
        assert_eq!(0.005, output[0].capacity);
    }

    #[test]
    fn get_station_real_kpi() {
        let output: super::get_station_real_kpi::GetStationRealKpi =
            super::parse(read_data("getStationRealKpi.json")).unwrap();
        assert_eq!("StationCode", output[0].station_code);
        assert_eq!(Some(12.5), output[0].data_item_map.day_power);
    }

    #[test]
    fn get_dev_list() {
        let output: super::get_device_list::GetDevicesList =
            super::parse(read_data("getDevList.json")).unwrap();
        assert_eq!("devName1", output[0].dev_name);
        assert_eq!("devName2", output[1].dev_name);
        assert_eq!(DeviceTypeId::from(1), output[0].dev_type_id);
        assert_eq!(DeviceTypeId::UnsupportedDeviceTypeId(62), output[1].dev_type_id);
    }

    #[test]
    fn get_device_real_kpi() {
        let data = read_data("getDevRealKpi.json");
        match GetDeviceRealKpi::from_data(DeviceTypeId::from(1), data).unwrap() {
            GetDeviceRealKpi::StringInverter(i) => {
                assert_eq!(Some(2.053), i[0].data_item_map.active_power);
                assert_eq!(None, i[1].data_item_map.temperature);
            }
        }
    }

    #[test]
    fn get_device_real_kpi_unsupported() {
        let data = read_data("getDevRealKpi.json");
        assert!(matches!(
            GetDeviceRealKpi::from_data(DeviceTypeId::from(62), data),
            Err(Error::UnknownDeviceType(62))
        ));
    }

    #[test]
    fn get_device_real_kpi_wrong_shape() {
        let data = serde_json::json!({"devId": 1});
        assert!(matches!(
            GetDeviceRealKpi::from_data(DeviceTypeId::from(1), data),
            Err(Error::UnexpectedApiResponse(_))
        ));
    }
}
