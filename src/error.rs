//! Handler-level error taxonomy
//!
//! The store signals absence with `Option` and a full id space with
//! `IdsExhausted`; handlers turn those and every request-shape problem into
//! one of these, and each renders as exactly one plain-text response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use thiserror::Error;

use crate::http;
use crate::store::{IdsExhausted, InvalidItemId};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid item ID")]
    InvalidItemId(#[from] InvalidItemId),

    #[error("Invalid request payload")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("Unable to parse form")]
    InvalidForm(#[source] serde_urlencoded::de::Error),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Unable to read request body")]
    BodyRead,

    #[error("Item not found")]
    NotFound,

    #[error("No item IDs left")]
    IdsExhausted(#[from] IdsExhausted),

    /// `allow` is the value of the `Allow` header
    #[error("Unsupported method")]
    MethodNotAllowed { allow: &'static str },
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidItemId(_) | Self::InvalidPayload(_) | Self::InvalidForm(_) | Self::BodyRead => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::IdsExhausted(_) => StatusCode::INSUFFICIENT_STORAGE,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let message = self.to_string();
        match self {
            Self::MethodNotAllowed { allow } => http::build_405_response(&message, allow),
            _ => http::build_error_response(self.status(), &message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let bad_id: ApiError = "abc".parse::<crate::store::ItemId>().unwrap_err().into();
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad_id.to_string(), "Invalid item ID");

        let payload = serde_json::from_str::<crate::store::Item>("{").unwrap_err();
        assert_eq!(
            ApiError::InvalidPayload(payload).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(IdsExhausted).status(),
            StatusCode::INSUFFICIENT_STORAGE
        );
        assert_eq!(
            ApiError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::MethodNotAllowed { allow: "GET" }.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_method_not_allowed_response() {
        let response = ApiError::MethodNotAllowed { allow: "GET, POST" }.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], "GET, POST");
    }
}
