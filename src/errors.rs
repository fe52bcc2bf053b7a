use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::authz::AuthzError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("forbidden: {message}")]
    Forbidden {
        message: String,
        messages: Vec<String>,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Forbidden carrying the deny messages collected by the decision manager
    pub fn denied(messages: &[String]) -> Self {
        let message = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "access denied".to_string());
        Self::Forbidden {
            message,
            messages: messages.to_vec(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        let (error, messages) = match self {
            AppError::Forbidden { messages, .. } => ("forbidden", messages),
            AppError::Configuration(_) => ("configuration", Vec::new()),
            AppError::Internal(_) => ("internal", Vec::new()),
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message,
            messages,
        };

        (status, Json(payload)).into_response()
    }
}

impl From<AuthzError> for AppError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Configuration(message) => Self::Configuration(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}
