pub type Endpoint = str;

pub const LOGIN: &Endpoint = "login";

pub const STATIONS: &Endpoint = "getStationList";
pub const STATION_REAL_KPI: &Endpoint = "getStationRealKpi";
pub const STATION_KPI_HOUR: &Endpoint = "getKpiStationHour";
pub const STATION_KPI_DAY: &Endpoint = "getKpiStationDay";
pub const STATION_KPI_MONTH: &Endpoint = "getKpiStationMonth";
pub const STATION_KPI_YEAR: &Endpoint = "getKpiStationYear";

pub const DEVICES: &Endpoint = "getDevList";
pub const DEVICE_REAL_KPI: &Endpoint = "getDevRealKpi";
pub const DEVICE_FIVE_MINUTES: &Endpoint = "getDevFiveMinutes";
pub const DEVICE_KPI_HOUR: &Endpoint = "getDevKpiHour";
pub const DEVICE_KPI_DAY: &Endpoint = "getDevKpiDay";
pub const DEVICE_KPI_MONTH: &Endpoint = "getDevKpiMonth";
pub const DEVICE_KPI_YEAR: &Endpoint = "getDevKpiYear";

pub const DEVICE_ON_OFF: &Endpoint = "devOnOff";
pub const DEVICE_UPGRADE: &Endpoint = "devUpgrade";
pub const DEVICE_UPGRADE_INFO: &Endpoint = "getDevUpgradeInfo";

/// `{base}/{endpoint}`, tolerating a trailing slash on `base`.
pub fn url(base: &str, endpoint: &Endpoint) -> String {
    format!("{}/{}", base.trim_end_matches('/'), endpoint)
}

#[cfg(test)]
mod test {
    #[test]
    fn url_joins_base_and_endpoint() {
        assert_eq!(
            "https://eu5.fusionsolar.huawei.com/thirdData/getStationList",
            super::url("https://eu5.fusionsolar.huawei.com/thirdData", super::STATIONS)
        );
        assert_eq!(
            "http://localhost:1234/login",
            super::url("http://localhost:1234/", super::LOGIN)
        );
    }
}
