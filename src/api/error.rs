use super::envelope::Envelope;
use num_derive::FromPrimitive;
use thiserror::Error;

/// `failCode` values the gateway reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum FailCode {
    /// 305: not logged in, or the session was dropped server side.
    MustRelogin = 305,
    /// 306: request not authenticated.
    Unauthenticated = 306,
    /// 307: XSRF token rejected.
    TokenRejected = 307,
    /// 407: ACCESS_FREQUENCY_IS_TOO_HIGH
    AccessFrequencyIsTooHigh = 407,
}

impl FailCode {
    pub fn is_session_failure(self) -> bool {
        matches!(
            self,
            FailCode::MustRelogin | FailCode::Unauthenticated | FailCode::TokenRejected
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("transport error (status {status:?}): {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
    #[error("throttled by API: {0}")]
    Throttled(Envelope),
    /// Throttled on the single retry that follows a forced re-login. Not retried again.
    #[error("throttled by API after re-login: {0}")]
    ThrottledAfterRelogin(Envelope),
    #[error("session rejected by API ({code:?}): {envelope}")]
    SessionExpired { code: FailCode, envelope: Envelope },
    #[error("API error: {0}")]
    Vendor(Envelope),
    #[error("login failed: {0}")]
    Login(String),
    #[error("invalid API response ({1}): {0}")]
    InvalidResponse(String, String),
    #[error("unexpected API response: {0}")]
    UnexpectedApiResponse(String),
    #[error("unsupported device type {0}")]
    UnknownDeviceType(u64),
    #[error("cannot build KPI table: {0}")]
    Table(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_throttled(&self) -> bool {
        matches!(self, Error::Throttled(_) | Error::ThrottledAfterRelogin(_))
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::SessionExpired { .. })
    }

    /// Envelope that carried the failure, if the API answered with one.
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Error::Throttled(envelope)
            | Error::ThrottledAfterRelogin(envelope)
            | Error::Vendor(envelope)
            | Error::SessionExpired { envelope, .. } => Some(envelope),
            _ => None,
        }
    }
}

/// Map a reqwest failure (network or non-2xx status) to `Error::Transport`.
pub(crate) fn map_transport_err(error: reqwest::Error) -> Error {
    let status: Option<http::StatusCode> = error.status();
    Error::Transport {
        status: status.map(|s| s.as_u16()),
        message: error.to_string(),
    }
}
