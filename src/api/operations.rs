use super::endpoint;
use super::response::get_device_list::GetDevicesList;
use super::response::get_device_real_kpi::GetDeviceRealKpi;
use super::response::get_station_real_kpi::GetStationRealKpi;
use super::response::get_stations_list::GetStationsList;
use super::response::parse;
use super::{Client, Error};
use crate::model;
use crate::table::{self, KpiTable};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;

/// `collectTime` as the API wants it: whole seconds, expressed in milliseconds.
pub fn collect_time(time: &DateTime<Utc>) -> i64 {
    time.timestamp() * 1000
}

fn station_params(station_codes: &str) -> Value {
    json!({ "stationCodes": station_codes })
}

fn station_time_params(station_codes: &str, time: &DateTime<Utc>) -> Value {
    json!({ "stationCodes": station_codes, "collectTime": collect_time(time) })
}

fn device_params(dev_ids: &str, dev_type_id: u64) -> Value {
    json!({ "devIds": dev_ids, "devTypeId": dev_type_id })
}

fn device_time_params(dev_ids: &str, dev_type_id: u64, time: &DateTime<Utc>) -> Value {
    json!({ "devIds": dev_ids, "devTypeId": dev_type_id, "collectTime": collect_time(time) })
}

/// Raw operations. Station and device ids are comma separated lists, as the API takes them.
impl Client {
    pub async fn get_station_list(&self) -> Result<Value, Error> {
        self.request(endpoint::STATIONS, json!({})).await
    }

    pub async fn get_station_real_kpi(&self, station_codes: &str) -> Result<Value, Error> {
        self.request(endpoint::STATION_REAL_KPI, station_params(station_codes))
            .await
    }

    pub async fn get_station_kpi_hour(
        &self,
        station_codes: &str,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::STATION_KPI_HOUR,
            station_time_params(station_codes, time),
        )
        .await
    }

    pub async fn get_station_kpi_day(
        &self,
        station_codes: &str,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::STATION_KPI_DAY,
            station_time_params(station_codes, time),
        )
        .await
    }

    pub async fn get_station_kpi_month(
        &self,
        station_codes: &str,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::STATION_KPI_MONTH,
            station_time_params(station_codes, time),
        )
        .await
    }

    pub async fn get_station_kpi_year(
        &self,
        station_codes: &str,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::STATION_KPI_YEAR,
            station_time_params(station_codes, time),
        )
        .await
    }

    pub async fn get_dev_list(&self, station_codes: &str) -> Result<Value, Error> {
        self.request(endpoint::DEVICES, station_params(station_codes))
            .await
    }

    pub async fn get_dev_real_kpi(&self, dev_ids: &str, dev_type_id: u64) -> Result<Value, Error> {
        self.request(endpoint::DEVICE_REAL_KPI, device_params(dev_ids, dev_type_id))
            .await
    }

    pub async fn get_dev_five_minutes(
        &self,
        dev_ids: &str,
        dev_type_id: u64,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::DEVICE_FIVE_MINUTES,
            device_time_params(dev_ids, dev_type_id, time),
        )
        .await
    }

    pub async fn get_dev_kpi_hour(
        &self,
        dev_ids: &str,
        dev_type_id: u64,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::DEVICE_KPI_HOUR,
            device_time_params(dev_ids, dev_type_id, time),
        )
        .await
    }

    pub async fn get_dev_kpi_day(
        &self,
        dev_ids: &str,
        dev_type_id: u64,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::DEVICE_KPI_DAY,
            device_time_params(dev_ids, dev_type_id, time),
        )
        .await
    }

    pub async fn get_dev_kpi_month(
        &self,
        dev_ids: &str,
        dev_type_id: u64,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::DEVICE_KPI_MONTH,
            device_time_params(dev_ids, dev_type_id, time),
        )
        .await
    }

    pub async fn get_dev_kpi_year(
        &self,
        dev_ids: &str,
        dev_type_id: u64,
        time: &DateTime<Utc>,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::DEVICE_KPI_YEAR,
            device_time_params(dev_ids, dev_type_id, time),
        )
        .await
    }

    /// Switch devices on or off. `control_type` is passed through unchecked, see
    /// [`model::ControlType`] for the documented codes.
    pub async fn dev_on_off(
        &self,
        dev_ids: &str,
        dev_type_id: u64,
        control_type: u32,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::DEVICE_ON_OFF,
            json!({ "devIds": dev_ids, "devTypeId": dev_type_id, "controlType": control_type }),
        )
        .await
    }

    pub async fn dev_upgrade(&self, dev_ids: &str, dev_type_id: u64) -> Result<Value, Error> {
        self.request(endpoint::DEVICE_UPGRADE, device_params(dev_ids, dev_type_id))
            .await
    }

    pub async fn get_dev_upgrade_info(
        &self,
        dev_ids: &str,
        dev_type_id: u64,
    ) -> Result<Value, Error> {
        self.request(
            endpoint::DEVICE_UPGRADE_INFO,
            device_params(dev_ids, dev_type_id),
        )
        .await
    }

    /// Daily KPI of one station as a table indexed by `collectTime`.
    pub async fn station_kpi_day_table(
        &self,
        station_code: &str,
        time: &DateTime<Utc>,
    ) -> Result<KpiTable, Error> {
        let data = self.get_station_kpi_day(station_code, time).await?;
        table::flatten_kpi_records(&data)
    }
}

/// Typed helpers over the raw operations.
impl Client {
    pub async fn stations(&self) -> Result<Vec<model::Station>, Error> {
        let response: GetStationsList = parse(self.get_station_list().await?)?;
        Ok(response
            .into_iter()
            .map(|sta_resp| model::Station {
                code: sta_resp.station_code,
                name: sta_resp.station_name,
                /* convert MWp to kWp */
                capacity: sta_resp.capacity * 1000.0,
            })
            .collect())
    }

    /// Read real-time KPI of `station`. Stations that report no `day_power` are skipped.
    pub async fn station_real_kpis(
        &self,
        station: &model::Station,
    ) -> Result<Vec<model::StationRealKpi>, Error> {
        let response: GetStationRealKpi = parse(self.get_station_real_kpi(&station.code).await?)?;
        Ok(response
            .into_iter()
            .filter_map(|resp| {
                resp.data_item_map.day_power.map(|day_power| model::StationRealKpi {
                    code: resp.station_code,
                    day_power,
                })
            })
            .collect())
    }

    /// List all devices for `station`
    pub async fn devices(&self, station: &model::Station) -> Result<Vec<model::Device>, Error> {
        let response: GetDevicesList = parse(self.get_dev_list(&station.code).await?)?;
        Ok(response
            .into_iter()
            .map(|resp| model::Device {
                type_id: resp.dev_type_id,
                id: resp.id,
                name: resp.dev_name,
            })
            .collect())
    }

    /// Takes `device: Device` and if `device.type_id` is supported, reads KPI for that device.
    pub async fn device_real_kpis(
        &self,
        device: &model::Device,
    ) -> Result<Vec<model::DeviceRealKpi>, Error> {
        if let model::DeviceTypeId::UnsupportedDeviceTypeId(id) = device.type_id {
            return Err(Error::UnknownDeviceType(id));
        }

        let data = self
            .get_dev_real_kpi(&device.id.to_string(), device.type_id.as_u64())
            .await?;

        match GetDeviceRealKpi::from_data(device.type_id, data)? {
            GetDeviceRealKpi::StringInverter(response) => Ok(response
                .into_iter()
                .map(|resp| model::DeviceRealKpi {
                    id: resp.dev_id,
                    temperature: resp.data_item_map.temperature,
                    active_power: resp.data_item_map.active_power,
                })
                .collect()),
        }
    }

    /// Dump devices KPI
    ///
    /// Iterate through all stations and all devices within those stations. Collect the raw
    /// `dataItemMap` of one device per device type, for reporting what unsupported types send.
    pub async fn dump_devices(&self) -> Result<HashMap<u64, Value>, Error> {
        let stations = self.stations().await?;
        let mut dump: HashMap<u64, Value> = HashMap::new();

        for station in stations {
            let devices = match self.devices(&station).await {
                Ok(devices) => devices,
                Err(e) => {
                    log::warn!("Cannot list devices of station {}: {}", station.code, e);
                    continue;
                }
            };

            for device in devices {
                let type_id = device.type_id.as_u64();
                let data = self
                    .get_dev_real_kpi(&device.id.to_string(), type_id)
                    .await?;

                match data.get(0).and_then(|v| v.get("dataItemMap")) {
                    Some(data_item_map) => {
                        dump.insert(type_id, data_item_map.to_owned());
                    }
                    None => log::warn!(
                        "No dataItemMap returned for device {}: {}",
                        type_id,
                        device.id
                    ),
                }
            }
        }

        Ok(dump)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn collect_time_drops_sub_second_part() {
        let time = Utc.timestamp_millis_opt(1_635_724_800_789).unwrap();
        assert_eq!(1_635_724_800_000, collect_time(&time));
    }

    #[test]
    fn params() {
        let time = Utc.timestamp_opt(1_635_724_800, 0).unwrap();
        assert_eq!(
            json!({"stationCodes": "NE=1,NE=2", "collectTime": 1_635_724_800_000i64}),
            station_time_params("NE=1,NE=2", &time)
        );
        assert_eq!(
            json!({"devIds": "10,11", "devTypeId": 1, "collectTime": 1_635_724_800_000i64}),
            device_time_params("10,11", 1, &time)
        );
    }
}
