//! Uniform response envelope
//!
//! Every endpoint answers with `{status, message, data: {data}}` where
//! `message` is `"success"` or `"error"` and the inner `data` carries either
//! the result or the error text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Outcome reported in the envelope's `message` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

/// Wrapper holding the envelope payload under a `data` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload<T> {
    pub data: T,
}

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: Outcome,
    pub data: Payload<T>,
}

impl<T> Envelope<T> {
    pub fn success(status: StatusCode, data: T) -> Self {
        Self::new(status, Outcome::Success, data)
    }

    pub fn error(status: StatusCode, data: T) -> Self {
        Self::new(status, Outcome::Error, data)
    }

    fn new(status: StatusCode, message: Outcome, data: T) -> Self {
        Self {
            status: status.as_u16(),
            message,
            data: Payload { data },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
