use super::error::{Error, FailCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Wrapper every thirdData response comes in.
///
/// Application errors arrive with HTTP 200 and `success: false`; the reason is in `failCode`
/// and, for some codes, in `data` (e.g. `"ACCESS_FREQUENCY_IS_TOO_HIGH"`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub fail_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl Envelope {
    /// Parse a response body. Anything that is not a JSON object ends up as `InvalidResponse`.
    pub fn decode(body: &str) -> Result<Envelope, Error> {
        serde_json::from_str::<Envelope>(body)
            .map_err(|e| Error::InvalidResponse(body.to_string(), e.to_string()))
    }

    pub fn fail_code(&self) -> Option<FailCode> {
        self.fail_code.and_then(num::FromPrimitive::from_i64)
    }

    /// Carry `data` forward on success, otherwise classify the failure.
    pub fn into_result(self) -> Result<Value, Error> {
        if self.success {
            return Ok(self.data);
        }

        match self.fail_code() {
            Some(FailCode::AccessFrequencyIsTooHigh) => {
                log::debug!("failCode 407: {}", self);
                Err(Error::Throttled(self))
            }
            Some(code) if code.is_session_failure() => {
                log::debug!("failCode {}: {}", code as i64, self);
                Err(Error::SessionExpired {
                    code,
                    envelope: self,
                })
            }
            _ => Err(Error::Vendor(self)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn classify(body: &str) -> Result<Value, Error> {
        Envelope::decode(body).and_then(Envelope::into_result)
    }

    #[test]
    fn success_yields_data() {
        let data = classify(r#"{"success":true,"data":[{"stationCode":"NE=1"}],"failCode":0}"#)
            .unwrap();
        assert_eq!("NE=1", data[0]["stationCode"]);
    }

    #[test]
    fn throttled() {
        let err = classify(
            r#"{"data":"ACCESS_FREQUENCY_IS_TOO_HIGH","failCode":407,"params":null,"success":false}"#,
        )
        .unwrap_err();
        assert!(err.is_throttled());
        assert_eq!(Some(407), err.envelope().and_then(|e| e.fail_code));
    }

    #[test]
    fn session_codes_stay_distinct() {
        let codes = vec![
            (305, FailCode::MustRelogin),
            (306, FailCode::Unauthenticated),
            (307, FailCode::TokenRejected),
        ];
        for (raw, expected) in codes {
            let body = format!(r#"{{"success":false,"failCode":{},"data":null}}"#, raw);
            match classify(&body) {
                Err(Error::SessionExpired { code, envelope }) => {
                    assert_eq!(expected, code);
                    assert_eq!(Some(raw), envelope.fail_code);
                }
                other => panic!("unexpected result for {}: {:?}", raw, other),
            }
        }
    }

    #[test]
    fn other_fail_code_is_vendor_error() {
        let err = classify(r#"{"success":false,"failCode":20010,"message":"bad station"}"#)
            .unwrap_err();
        match err {
            Error::Vendor(envelope) => {
                assert_eq!(Some(20010), envelope.fail_code);
                assert_eq!(Some("bad station".to_string()), envelope.message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_success_is_vendor_error() {
        assert!(matches!(classify(r#"{"data":[]}"#), Err(Error::Vendor(_))));
    }

    #[test]
    fn garbage_is_invalid_response() {
        assert!(matches!(
            classify("<html>maintenance</html>"),
            Err(Error::InvalidResponse(_, _))
        ));
    }
}
