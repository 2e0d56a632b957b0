//! HTTP mapping of bridge errors.
//!
//! | Variant | Status | Meaning for callers |
//! |---|---|---|
//! | [`ApiError::Validation`] | `400` | Fix the request; retrying unchanged is pointless |
//! | [`ApiError::NoSimulator`] | `409` | Request was fine; retry once a simulator connects |
//! | [`ApiError::Internal`] | `500` | Bridge-side failure |
//!
//! Every variant renders as `{"error": "<message>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use simbridge_types::BridgeError;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Validation(String),
    NoSimulator,
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NoSimulator => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(msg) | ApiError::Internal(msg) => msg.clone(),
            ApiError::NoSimulator => BridgeError::NoSimulator.to_string(),
        }
    }
}

impl From<BridgeError> for ApiError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Validation(msg) => ApiError::Validation(msg),
            BridgeError::NoSimulator => ApiError::NoSimulator,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_and_no_simulator_are_distinct_client_errors() {
        let v = ApiError::validation("Missing \"x\"");
        let n = ApiError::NoSimulator;
        assert!(v.status().is_client_error());
        assert!(n.status().is_client_error());
        assert_ne!(v.status(), n.status());
        assert_ne!(v.message(), n.message());
    }

    #[test]
    fn bridge_errors_map_onto_api_errors() {
        assert_eq!(ApiError::from(BridgeError::NoSimulator), ApiError::NoSimulator);
        assert_eq!(
            ApiError::from(BridgeError::Validation("bad".into())),
            ApiError::Validation("bad".into())
        );
        assert!(matches!(
            ApiError::from(BridgeError::Serialization("boom".into())),
            ApiError::Internal(_)
        ));
    }
}
