#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use chrono::{NaiveDate, TimeZone, Utc};
use config::Config;
use fusionsolar_client::config::{API_URL, BACKOFF_UNIT_SECS, MAX_RETRY, TOKEN_VALIDITY_SECS};
use fusionsolar_client::{Client, ClientConfig, Credentials};
use rocket::{Build, Rocket, State};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

mod metrics;
mod responder;

use responder::ApiFailure;

#[derive(Clone, serde::Deserialize)]
pub struct FusionsolarConfig {
    api_url: String,
    username: String,
    password: String,
    interval: u64,
    max_retry: u32,
    backoff_secs: u64,
    token_validity_secs: u64,
}

impl From<&FusionsolarConfig> for ClientConfig {
    fn from(settings: &FusionsolarConfig) -> Self {
        ClientConfig::default()
            .with_base_url(settings.api_url.clone())
            .with_max_retry(settings.max_retry)
            .with_backoff_unit(Duration::from_secs(settings.backoff_secs))
            .with_token_validity(Duration::from_secs(settings.token_validity_secs))
    }
}

/// Structure containing state for API handlers.
pub struct StateData {
    client: Client,
    interval: u64,
    /// Timestamp of last successful metric collection via `metrics::collect()`
    timestamp: Mutex<Option<Instant>>,
}

impl StateData {
    /// Updates `timestamp` to `now()`.
    fn touch(&self) {
        if let Ok(mut ts) = self.timestamp.lock() {
            *ts = Some(Instant::now());
        } else {
            log::trace!("Unable to lock timestamp mutex, will refresh again")
        }
    }

    /// Checks whether `interval_secs` elapsed since last `touch()`
    fn interval_elapsed(&self, interval_secs: u64) -> bool {
        let elapsed_opt = self
            .timestamp
            .lock()
            .ok()
            .and_then(|a| a.map(|b| b.elapsed().as_secs()));

        if let Some(elapsed) = elapsed_opt {
            elapsed > interval_secs
        } else {
            /* If there is None timestamp/elapsed, always return true to trigger action */
            true
        }
    }
}

pub fn read_settings() -> FusionsolarConfig {
    let mut settings = Config::default();
    settings
        .merge(config::Environment::with_prefix("FS"))
        .unwrap()
        .set_default("api_url", API_URL)
        .unwrap()
        .set_default("interval", 300i64)
        .unwrap()
        .set_default("max_retry", MAX_RETRY as i64)
        .unwrap()
        .set_default("backoff_secs", BACKOFF_UNIT_SECS as i64)
        .unwrap()
        .set_default("token_validity_secs", TOKEN_VALIDITY_SECS as i64)
        .unwrap();

    settings.try_into().expect("Configuration error")
}

#[get("/metrics")]
async fn metrics_route(state: &State<StateData>) -> Result<String, ApiFailure> {
    if state.interval_elapsed(state.interval) {
        metrics::collect(&state.client).await?;
        state.touch();
    } else {
        log::info!("interval time not yet elapsed since last run; returning cached result")
    }
    Ok(metrics::read()?)
}

#[get("/dump-devices")]
async fn dump_devices_route(state: &State<StateData>) -> Result<String, ApiFailure> {
    let dump = state.client.dump_devices().await?;

    Ok(format!("{:#?}", dump))
}

/// Daily KPI of one station as CSV. `date` is `YYYY-MM-DD`, taken as midnight UTC.
#[get("/stations/<code>/kpi-day/<date>")]
async fn kpi_day_route(
    state: &State<StateData>,
    code: &str,
    date: &str,
) -> Result<String, ApiFailure> {
    let midnight = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ApiFailure::BadRequest(format!("invalid date: {}", date)))?;

    let table = state
        .client
        .station_kpi_day_table(code, &Utc.from_utc_datetime(&midnight))
        .await?;

    Ok(table.to_string())
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let settings = read_settings();
    let client = Client::builder(Credentials::new(
        settings.username.clone(),
        settings.password.clone(),
    ))
    .config(ClientConfig::from(&settings))
    .middleware(Arc::new(metrics::RequestMetrics))
    .build()
    .expect("Cannot create FusionSolar client");

    let state = StateData {
        client,
        interval: settings.interval,
        timestamp: Mutex::new(None),
    };

    rocket::build()
        .manage(state)
        .mount("/", routes![metrics_route, dump_devices_route, kpi_day_route])
}
