//! Custom error types for the API service

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::StoreError;
use thiserror::Error;
use tracing::error;

use crate::{responses::Envelope, validation::ValidationErrors};

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request (undecodable body, bad path parameter)
    #[error("{0}")]
    BadRequest(String),

    /// Payload failed its field rules
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Registration collided with an existing username
    #[error("Username taken")]
    UsernameTaken,

    /// Record store failure, including timeouts
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) | ApiError::UsernameTaken => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        Envelope::error(status, self.to_string()).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
