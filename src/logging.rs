//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bodies longer than this many bytes are truncated in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body that is buffered, the same as axum's default body limit.
pub const REQUEST_BODY_LIMIT: usize = 2 * 1024 * 1024;

const REDACTED_AUTHORIZATION: &str = "Bearer ********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// The `Authorization` header is never logged.
///
/// Bodies are passed on byte for byte. Requests with a body larger than
/// [REQUEST_BODY_LIMIT] are rejected with 413.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, REQUEST_BODY_LIMIT).await {
        Ok(body_bytes) => body_bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    tracing::info!(
        "Received request: {} {}\nheaders: {:#?}",
        parts.method,
        parts.uri,
        redact_headers(&parts.headers)
    );
    log_body(&body_bytes);

    let request = Request::from_parts(parts, body_bytes.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body_bytes) => body_bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        "Sending response: {}\nheaders: {:#?}",
        parts.status,
        parts.headers
    );
    log_body(&body_bytes);

    Response::from_parts(parts, Body::from(body_bytes))
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static(REDACTED_AUTHORIZATION),
        );
    }

    headers
}

fn log_body(body_bytes: &Bytes) {
    let body = String::from_utf8_lossy(body_bytes);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("body: {}...", truncate(&body, LOG_BODY_LENGTH_LIMIT));
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("body: {body:?}");
    }
}

/// The longest prefix of `text` that is at most `limit` bytes and ends on a
/// character boundary.
fn truncate(text: &str, limit: usize) -> &str {
    let end = text
        .char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(text.len()))
        .take_while(|&index| index <= limit)
        .last()
        .unwrap_or(0);

    &text[..end]
}
