use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use constellation_types::api::ErrorBody;
use constellation_types::models::ActionCategory;

/// Failures the star service can report. Everything except `Storage` is an
/// expected outcome the client can act on.
#[derive(Debug, Error)]
pub enum StarError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { category: ActionCategory },

    #[error("Already reacted to this star")]
    Duplicate,

    #[error("Star not found")]
    NotFound { id: String },

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl StarError {
    pub fn validation(message: impl Into<String>) -> Self {
        StarError::Validation {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StarError::Validation { .. } | StarError::Duplicate => StatusCode::BAD_REQUEST,
            StarError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            StarError::NotFound { .. } => StatusCode::NOT_FOUND,
            StarError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Malformed bodies and query strings are input errors like any other.
impl From<JsonRejection> for StarError {
    fn from(rejection: JsonRejection) -> Self {
        StarError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for StarError {
    fn from(rejection: QueryRejection) -> Self {
        StarError::validation(rejection.body_text())
    }
}

impl IntoResponse for StarError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            StarError::Storage(e) => {
                error!("Storage failure: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
