use serde::Deserialize;

#[derive(Deserialize)]
pub struct DataItemMap {
    #[serde(default)]
    pub day_power: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    pub data_item_map: DataItemMap,
    pub station_code: String,
}

pub type GetStationRealKpi = Vec<Data>;
