pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod middleware;
mod operations;
pub mod pipeline;
pub mod response;
pub mod session;

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::model::Credentials;
pub use envelope::Envelope;
pub use error::{Error, FailCode};
pub use operations::collect_time;
use middleware::{AuthGate, ThrottleRetry};
use pipeline::{Middleware, Pipeline, Request};
use serde_json::Value;
use session::Session;
use std::sync::Arc;

/// FusionSolar thirdData client.
///
/// Every call goes through the same pipeline: caller supplied middleware, then throttle retry,
/// then the authentication gate, then the HTTP round trip.
pub struct Client {
    session: Arc<Session>,
    pipeline: Pipeline,
}

pub struct ClientBuilder {
    credentials: Credentials,
    config: ClientConfig,
    clock: Arc<dyn Clock>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add a middleware outside the built-in retry and authentication stages. Middleware added
    /// first runs first.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn build(self) -> Result<Client, Error> {
        let session = Arc::new(Session::new(self.credentials, &self.config, self.clock)?);

        let mut middleware = self.middleware;
        middleware.push(Arc::new(ThrottleRetry::new(
            self.config.max_retry,
            self.config.backoff_unit,
        )));
        middleware.push(Arc::new(AuthGate::new(session.clone())));

        Ok(Client {
            pipeline: Pipeline::new(middleware, session.clone()),
            session,
        })
    }
}

impl Client {
    pub fn builder(credentials: Credentials) -> ClientBuilder {
        ClientBuilder {
            credentials,
            config: ClientConfig::default(),
            clock: Arc::new(SystemClock),
            middleware: Vec::new(),
        }
    }

    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Client, Error> {
        Client::builder(credentials).config(config).build()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in now instead of on first use.
    pub async fn login(&self) -> Result<(), Error> {
        middleware::Authenticator::login(self.session.as_ref()).await
    }

    /// Call `endpoint` with `payload` as JSON body and return the `data` of the response.
    pub async fn request(&self, endpoint: &str, payload: Value) -> Result<Value, Error> {
        let payload = match payload {
            Value::Null => Value::Object(Default::default()),
            payload => payload,
        };
        self.pipeline.run(&Request::new(endpoint, payload)).await
    }
}
