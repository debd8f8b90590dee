use fusionsolar_client::Error;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::io::Cursor;

/// Route failure, rendered as a small HTML page.
#[derive(Debug)]
pub enum ApiFailure {
    Api(Error),
    BadRequest(String),
}

impl From<Error> for ApiFailure {
    fn from(error: Error) -> Self {
        ApiFailure::Api(error)
    }
}

fn html(status: Status, error: String) -> response::Result<'static> {
    Response::build()
        .status(status)
        .sized_body(error.len(), Cursor::new(error))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for ApiFailure {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            ApiFailure::Api(Error::Throttled(envelope))
            | ApiFailure::Api(Error::ThrottledAfterRelogin(envelope)) => html(
                Status::TooManyRequests,
                format!("<html><body><h3>429 Too Many Requests</h3>Downstream API response: <code>{}</code></body></html>", envelope),
            ),
            ApiFailure::Api(e @ Error::Login(_)) | ApiFailure::Api(e @ Error::SessionExpired { .. }) => html(
                Status::Forbidden,
                format!("<html><body><h3>403 Forbidden</h3>Error while authenticating to downstream API: <code>{}</code></body></html>", e),
            ),
            ApiFailure::BadRequest(s) => html(
                Status::BadRequest,
                format!("<html><body><h3>400 Bad Request</h3><code>{}</code></body></html>", s),
            ),
            ApiFailure::Api(e) => html(
                Status::InternalServerError,
                format!("<html><body><h3>Unknown exception</h3><code>{}</code></body></html>", e),
            ),
        }
    }
}
