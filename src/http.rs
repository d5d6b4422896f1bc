//! Shared plumbing for the blocking HTTP clients.

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::error::KeyReelError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// Turn a non-success response into an error carrying its body.
///
/// `wrap` picks the error variant for the calling service.
pub(crate) fn check(
    response: Response,
    what: &str,
    wrap: fn(String) -> KeyReelError,
) -> Result<Response, KeyReelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(wrap(format!("{what} returned {status}: {}", body.trim())))
}
