//! Client for the Huawei FusionSolar northbound ("thirdData") API.
//!
//! ```no_run
//! # async fn run() -> Result<(), fusionsolar_client::Error> {
//! use fusionsolar_client::{Client, ClientConfig, Credentials};
//!
//! let client = Client::new(Credentials::new("api-user", "system-code"), ClientConfig::default())?;
//! for station in client.stations().await? {
//!     println!("{} ({} kWp)", station.name, station.capacity);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod clock;
pub mod config;
pub mod model;
pub mod table;

pub use api::{Client, ClientBuilder, Envelope, Error, FailCode};
pub use config::ClientConfig;
pub use model::Credentials;
pub use table::{flatten_kpi_records, KpiTable};
