use async_trait::async_trait;
use fusionsolar_client::api::pipeline::{Middleware, Next, Request};
use fusionsolar_client::model::{Device, DeviceRealKpi, DeviceTypeId, Station};
use fusionsolar_client::{Client, Error};
use prometheus::{Encoder, GaugeVec, IntCounterVec, TextEncoder};
use serde_json::Value;

lazy_static! {
    static ref DAY_POWER_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "day_power",
            "total amount of power generated in current day (in kWh)",
        ),
        &["station_code"],
    )
    .unwrap();
    static ref DEVICE_ACTIVE_POWER_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "device_active_power",
            "active power production reported by inverter",
        ),
        &["station_code", "device_id", "device_type_id",],
    )
    .unwrap();
    static ref DEVICE_TEMPERATURE_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("device_temperature", "device reported temperature",),
        &["station_code", "device_id", "device_type_id",],
    )
    .unwrap();
    static ref REQUESTS_COUNTER: IntCounterVec = register_int_counter_vec!(
        opts!(
            "fusionsolar_requests_total",
            "calls made to the FusionSolar API, after retries, by outcome",
        ),
        &["endpoint", "outcome"],
    )
    .unwrap();
}

fn outcome(result: &Result<Value, Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(Error::Throttled(_)) | Err(Error::ThrottledAfterRelogin(_)) => "throttled",
        Err(Error::SessionExpired { .. }) => "session_expired",
        Err(Error::Vendor(_)) => "api_error",
        Err(Error::Transport { .. }) => "transport_error",
        Err(_) => "error",
    }
}

/// Counts every call leaving the client, labelled with its final outcome.
pub struct RequestMetrics;

#[async_trait]
impl Middleware for RequestMetrics {
    async fn handle(&self, request: &Request, next: Next<'_>) -> Result<Value, Error> {
        let result = next.run(request).await;
        REQUESTS_COUNTER
            .with_label_values(&[request.endpoint.as_str(), outcome(&result)])
            .inc();
        result
    }
}

/// Process DeviceRealKpi `device_real_kpi` of `device` installed in `station` and feed them to
/// Prometheus metrics. Based on device type, different KPIs can be presented.
fn process_device_real_kpi(dev_real_kpi: &DeviceRealKpi, station: &Station, device: &Device) {
    if let DeviceTypeId::SupportedDeviceTypeId(_) = device.type_id {
        let labels = [
            station.code.clone(),
            dev_real_kpi.id.to_string(),
            device.type_id.as_u64().to_string(),
        ];
        let labels = [labels[0].as_str(), labels[1].as_str(), labels[2].as_str()];

        if let Some(active_power) = dev_real_kpi.active_power {
            DEVICE_ACTIVE_POWER_GAUGE
                .with_label_values(&labels)
                .set(active_power);
        }

        if let Some(temperature) = dev_real_kpi.temperature {
            DEVICE_TEMPERATURE_GAUGE
                .with_label_values(&labels)
                .set(temperature);
        }
    }
}

/// Iterate through all devices within station and collect KPI for supported ones.
async fn collect_station_devices(client: &Client, station: &Station) -> Result<(), Error> {
    let devices = client.devices(station).await?;

    for device in devices {
        match client.device_real_kpis(&device).await {
            Ok(dev_kpi_vec) => match dev_kpi_vec.get(0) {
                Some(dev_real_kpi) => process_device_real_kpi(dev_real_kpi, station, &device),
                None => log::error!(
                    "No KPI returned for device {} of station {}",
                    device.id,
                    station.code
                ),
            },
            Err(Error::UnknownDeviceType(type_id)) => {
                log::trace!("Skipping device {} of unsupported type {}", device.id, type_id)
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Collect `day_power` metric for every station.
async fn collect_day_power(client: &Client) -> Result<(), Error> {
    let stations = client.stations().await?;

    for station in stations {
        let kpi = client.station_real_kpis(&station).await?;

        match kpi.get(0) {
            None => {
                log::warn!("No KPI returned for station: {}", &station.code);
            }
            Some(kpi) => {
                DAY_POWER_GAUGE
                    .with_label_values(&[&station.code])
                    .set(kpi.day_power);
            }
        }

        collect_station_devices(client, &station).await?;
    }

    Ok(())
}

/// Collect all supported metrics through `client`, updating Prometheus exporter registry.
pub async fn collect(client: &Client) -> Result<(), Error> {
    collect_day_power(client).await
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| Error::Internal(format!("Cannot encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| Error::Internal(e.to_string()))
}
