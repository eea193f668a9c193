use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Turn an extracted JSON body into a typed request.
///
/// Bodies over the router's size limit are 413. Missing, malformed and
/// mistyped bodies are all reported as a validation failure on the `body` field.
pub fn parse_body<T: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<T, ApiError> {
    let Json(payload) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::invalid_field("body", "invalid_json", rejection.body_text())
        }
    })?;
    serde_json::from_value(payload)
        .map_err(|e| ApiError::invalid_field("body", "invalid_shape", e.to_string()))
}
