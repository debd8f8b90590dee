use serde::Deserialize;
use std::time::Duration;

pub const API_URL: &str = "https://eu5.fusionsolar.huawei.com/thirdData";

/// Number of throttle retries before giving up.
pub const MAX_RETRY: u32 = 10;
/// Backoff unit; retry `i` waits `i` units.
pub const BACKOFF_UNIT_SECS: u64 = 3;
/// How long a login token is trusted before logging in again.
pub const TOKEN_VALIDITY_SECS: u64 = 1200;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_retry: u32,
    #[serde(with = "secs")]
    pub backoff_unit: Duration,
    #[serde(with = "secs")]
    pub token_validity: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: API_URL.to_string(),
            max_retry: MAX_RETRY,
            backoff_unit: Duration::from_secs(BACKOFF_UNIT_SECS),
            token_validity: Duration::from_secs(TOKEN_VALIDITY_SECS),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_token_validity(mut self, validity: Duration) -> Self {
        self.token_validity = validity;
        self
    }
}

mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(API_URL, config.base_url);
        assert_eq!(10, config.max_retry);
        assert_eq!(Duration::from_secs(3), config.backoff_unit);
        assert_eq!(Duration::from_secs(1200), config.token_validity);
    }

    #[test]
    fn deserialize_partial() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"max_retry": 2, "token_validity": 600}"#).unwrap();
        assert_eq!(2, config.max_retry);
        assert_eq!(Duration::from_secs(600), config.token_validity);
        assert_eq!(Duration::from_secs(3), config.backoff_unit);
        assert_eq!(API_URL, config.base_url);
    }
}
