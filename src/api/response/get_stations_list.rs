use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    pub station_code: String,
    pub station_name: String,
    /* MWp */
    pub capacity: f64,
}

pub type GetStationsList = Vec<Data>;
