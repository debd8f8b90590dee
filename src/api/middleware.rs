use super::pipeline::{Middleware, Next, Request};
use super::Error;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Retries calls the API rejected with failCode 407, waiting `attempt * unit` before each retry.
#[derive(Debug, Clone)]
pub struct ThrottleRetry {
    max_retry: u32,
    unit: Duration,
}

impl ThrottleRetry {
    pub fn new(max_retry: u32, unit: Duration) -> Self {
        ThrottleRetry { max_retry, unit }
    }

    pub fn delay(&self, attempt: u32) -> Result<Duration, Error> {
        self.unit.checked_mul(attempt).ok_or_else(|| {
            Error::Internal(format!(
                "backoff of {:?} x {} overflows",
                self.unit, attempt
            ))
        })
    }
}

#[async_trait]
impl Middleware for ThrottleRetry {
    async fn handle(&self, request: &Request, next: Next<'_>) -> Result<Value, Error> {
        let mut last = match next.run(request).await {
            Err(Error::Throttled(envelope)) => envelope,
            other => return other,
        };

        for attempt in 1..=self.max_retry {
            let delay = self.delay(attempt)?;
            log::debug!(
                "{} throttled, retry {}/{} in {:?}",
                request.endpoint,
                attempt,
                self.max_retry,
                delay
            );
            tokio::time::sleep(delay).await;

            match next.run(request).await {
                Err(Error::Throttled(envelope)) => last = envelope,
                other => return other,
            }
        }

        log::warn!(
            "{} still throttled after {} retries",
            request.endpoint,
            self.max_retry
        );
        Err(Error::Throttled(last))
    }
}

/// Something that can establish and refresh an API session.
///
/// Every successful login bumps a generation counter, so a caller holding a rejected session can
/// tell whether somebody already replaced it.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Log in if the cached token is past its validity window. Returns the current generation.
    async fn ensure_authenticated(&self) -> Result<u64, Error>;
    /// Log in unconditionally.
    async fn login(&self) -> Result<(), Error>;
    /// Log in unless the generation moved past `seen` in the meantime.
    async fn relogin(&self, seen: u64) -> Result<(), Error>;
}

/// Makes sure a valid session exists before the call and recovers once from a session the
/// server no longer accepts.
///
/// The retry after a re-login is final: a 407 on it comes back as
/// [`Error::ThrottledAfterRelogin`], which [`ThrottleRetry`] leaves alone.
pub struct AuthGate {
    auth: Arc<dyn Authenticator>,
}

impl AuthGate {
    pub fn new(auth: Arc<dyn Authenticator>) -> Self {
        AuthGate { auth }
    }
}

#[async_trait]
impl Middleware for AuthGate {
    async fn handle(&self, request: &Request, next: Next<'_>) -> Result<Value, Error> {
        let generation = self.auth.ensure_authenticated().await?;

        match next.run(request).await {
            Err(Error::SessionExpired { code, .. }) => {
                log::debug!(
                    "{} rejected session ({:?}), logging back in and retrying",
                    request.endpoint,
                    code
                );
                self.auth.relogin(generation).await?;
                match next.run(request).await {
                    Err(Error::Throttled(envelope)) => Err(Error::ThrottledAfterRelogin(envelope)),
                    other => other,
                }
            }
            other => other,
        }
    }
}
