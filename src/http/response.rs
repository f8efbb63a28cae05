//! HTTP response building module
//!
//! Builders for the handful of response shapes the handlers produce.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Build a response with the given status, content type and body
pub fn build_response(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(body.into()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback_response()
        })
}

/// Plain text 200
pub fn build_text_response(body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    build_response(StatusCode::OK, TEXT_PLAIN, body)
}

pub fn build_html_response(body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    build_response(StatusCode::OK, TEXT_HTML, body)
}

/// Plain-text error with a trailing newline
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let mut response = build_response(status, TEXT_PLAIN, format!("{message}\n"));
    response.headers_mut().insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// 405 listing the methods the path does support
pub fn build_405_response(message: &str, allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED, message);
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

/// Serialize `body` as compact JSON
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(json) => build_response(status, APPLICATION_JSON, json),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// 204 No Content
pub fn build_204_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::NO_CONTENT, &e);
            fallback_response()
        })
}

fn fallback_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
