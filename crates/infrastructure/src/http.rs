use std::time::Duration;

use reqwest::{Client, Response};
use tracing::warn;

use responder_core::{ResponderError, ResponderResult};

/// Builds a client whose every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> ResponderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ResponderError::config_error(format!("failed to build HTTP client: {e}")))
}

pub fn transport_error(service: &str, err: reqwest::Error) -> ResponderError {
    if err.is_timeout() {
        ResponderError::Timeout(format!("{service} request timed out"))
    } else if err.is_decode() {
        ResponderError::Serialization(format!("{service} response could not be decoded: {err}"))
    } else {
        // Strip the URL so query-string keys never reach the logs.
        ResponderError::Network(format!("{service}: {}", err.without_url()))
    }
}

/// Turns a non-2xx response into a collaborator error carrying the body.
pub async fn ensure_success(service: &str, response: Response) -> ResponderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(service, %status, "collaborator returned an error status");
    Err(ResponderError::collaborator(
        service,
        format!("HTTP {status} - {}", truncate(&body, 200)),
    ))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
