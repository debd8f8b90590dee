use super::endpoint;
use super::envelope::Envelope;
use super::error::{map_transport_err, Error};
use super::middleware::Authenticator;
use super::pipeline::{Dispatch, Request};
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::model::Credentials;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use http::header::{HeaderMap, HeaderValue, CONNECTION, CONTENT_TYPE};
use reqwest::Response;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const XSRF_TOKEN: &str = "XSRF-TOKEN";

struct SessionState {
    client: reqwest::Client,
    token: Option<String>,
    expires_at: DateTime<Utc>,
    /* bumped by every successful login */
    generation: u64,
}

/// Authenticated connection to the thirdData API.
///
/// Readers check the expiry under a shared lock; whoever finds it expired takes the write lock
/// and logs in, so concurrent callers wait for that single login instead of racing it.
pub struct Session {
    base_url: String,
    credentials: Credentials,
    validity: Duration,
    clock: Arc<dyn Clock>,
    state: RwLock<SessionState>,
}

/// Client with cookie store and the headers thirdData expects on every call. A new one is built
/// for each login, which drops whatever cookies the previous session collected.
fn build_client() -> Result<reqwest::Client, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::ClientBuilder::new()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .map_err(|e| Error::Internal(format!("cannot build HTTP client: {}", e)))
}

fn extract_xsrf_token(response: &Response) -> Option<String> {
    response
        .cookies()
        .find(|cookie| cookie.name() == XSRF_TOKEN)
        .map(|cookie| String::from(cookie.value()))
}

/// Check HTTP status, then decode and classify the envelope. Returns the `data` payload.
async fn read_envelope(response: Response) -> Result<Value, Error> {
    let response = response.error_for_status().map_err(map_transport_err)?;
    let body = response.text().await.map_err(map_transport_err)?;
    log::trace!("response: {}", body);
    Envelope::decode(&body)?.into_result()
}

impl Session {
    pub fn new(
        credentials: Credentials,
        config: &ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Session, Error> {
        let validity = Duration::from_std(config.token_validity)
            .map_err(|e| Error::Internal(format!("token validity out of range: {}", e)))?;

        Ok(Session {
            base_url: config.base_url.clone(),
            credentials,
            validity,
            clock,
            state: RwLock::new(SessionState {
                client: build_client()?,
                token: None,
                /* forces a login on first use */
                expires_at: DateTime::<Utc>::from(std::time::UNIX_EPOCH),
                generation: 0,
            }),
        })
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn expires_at(&self) -> DateTime<Utc> {
        self.state.read().await.expires_at
    }

    pub async fn is_expired(&self) -> bool {
        self.state.read().await.expires_at <= self.clock.now()
    }

    /// Post credentials with a fresh cookie jar. State is replaced only once the envelope is
    /// successful and the token cookie is present.
    async fn login_locked(&self, state: &mut SessionState) -> Result<(), Error> {
        let client = build_client()?;
        let url = endpoint::url(&self.base_url, endpoint::LOGIN);

        let request_body = HashMap::from([
            ("userName", self.credentials.username.to_owned()),
            ("systemCode", self.credentials.system_code.to_owned()),
        ]);

        log::debug!("logging in to {} as {}", url, self.credentials.username);

        let response = client
            .post(url)
            .json(&request_body)
            .send()
            .await
            .map_err(map_transport_err)?;
        let status = response.status();
        let token = extract_xsrf_token(&response);

        read_envelope(response).await?;

        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.validity).ok_or_else(|| {
            Error::Internal(format!(
                "token validity of {} from {} is out of range",
                self.validity, now
            ))
        })?;
        let token = token.ok_or_else(|| {
            Error::Login(format!(
                "No XSRF-TOKEN received (server responded {})",
                status
            ))
        })?;

        state.client = client;
        state.token = Some(token);
        state.expires_at = expires_at;
        state.generation += 1;

        log::debug!("logged in, token valid until {}", state.expires_at);
        Ok(())
    }
}

#[async_trait]
impl Authenticator for Session {
    async fn ensure_authenticated(&self) -> Result<u64, Error> {
        {
            let state = self.state.read().await;
            if state.expires_at > self.clock.now() {
                return Ok(state.generation);
            }
        }

        let mut state = self.state.write().await;
        /* someone else may have logged in while we waited for the lock */
        if state.expires_at <= self.clock.now() {
            self.login_locked(&mut state).await?;
        }
        Ok(state.generation)
    }

    async fn login(&self) -> Result<(), Error> {
        let mut state = self.state.write().await;
        self.login_locked(&mut state).await
    }

    async fn relogin(&self, seen: u64) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if state.generation != seen {
            log::debug!(
                "session already replaced (generation {} -> {}), not logging in again",
                seen,
                state.generation
            );
            return Ok(());
        }
        self.login_locked(&mut state).await
    }
}

#[async_trait]
impl Dispatch for Session {
    async fn dispatch(&self, request: &Request) -> Result<Value, Error> {
        let (client, token) = {
            let state = self.state.read().await;
            (state.client.clone(), state.token.clone())
        };
        let url = endpoint::url(&self.base_url, &request.endpoint);

        log::trace!("endpoint: {}, data: {}", request.endpoint, request.payload);

        let mut builder = client.post(url).json(&request.payload);
        if let Some(token) = token {
            builder = builder.header(XSRF_TOKEN, token);
        }

        let response = builder.send().await.map_err(map_transport_err)?;
        read_envelope(response).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    #[tokio::test]
    async fn new_session_is_expired() {
        let clock = Arc::new(ManualClock::new(Utc.timestamp_opt(1_600_000_000, 0).unwrap()));
        let session = Session::new(
            Credentials::new("user", "code"),
            &ClientConfig::default(),
            clock,
        )
        .unwrap();

        assert!(session.is_expired().await);
        assert_eq!(None, session.token().await);
        assert_eq!(0, session.expires_at().await.timestamp());
    }
}
