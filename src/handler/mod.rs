mod responses;
mod router;

use httpkit::http::request::Request;
use httpkit::http::response::Response;
use httpkit::http::status::HttpStatus;
use httpkit::{HttpError, Result};
use tracing::debug;

pub fn handle_request(req: &mut Request) -> Result<Response> {
    router::route(req)
}

/// Errors caused by what the client sent are a 400, the rest a 500.
pub fn handle_error(err: &HttpError) -> Response {
    match err {
        HttpError::MalformedMethodOverride(_)
        | HttpError::ConflictingHeaders(_)
        | HttpError::BodyDecode(_)
        | HttpError::InvalidArgument(_) => responses::error(HttpStatus::BadRequest),
        HttpError::InvalidStatusCode(_) | HttpError::Io(_) => responses::error(HttpStatus::InternalServerError),
    }
}

/// The error response for a failed `prepare`, prepared in turn. A second
/// failure leaves the headers as far as they got.
pub fn prepared_error(err: &HttpError, req: &mut Request) -> Response {
    let mut res = handle_error(err);
    if let Err(again) = res.prepare(req) {
        debug!(error = %again, "error response only partly prepared");
    }
    res
}
