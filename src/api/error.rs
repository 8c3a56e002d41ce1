use crate::auth::{AuthFailure, Authenticator};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Gateway error types, each mapped to a status and a short plain-text body.
#[derive(Debug, PartialEq)]
pub enum ApiError {
    /// Route called with the wrong HTTP method
    WrongMethod,
    /// `/events` body not declared as `application/json`
    UnsupportedContentType,
    /// Declared or streamed body exceeds the configured ceiling
    ContentTooLarge,
    /// Body could not be parsed as a JSON document
    InvalidPayload(String),
    /// No basic-auth credentials; carries the challenge header value
    Unauthorized { challenge: String },
    /// Shared key, subject or secret rejected
    Forbidden,
    /// Backing store failure
    Internal(String),
    /// Task catalog lookup failed
    TasksUnavailable,
}

impl ApiError {
    /// Translates an authentication failure without revealing which check failed.
    pub fn from_auth(failure: AuthFailure, authenticator: &Authenticator) -> Self {
        match failure {
            AuthFailure::MissingCredentials => ApiError::Unauthorized {
                challenge: authenticator.challenge(),
            },
            AuthFailure::WrongSharedKey
            | AuthFailure::UnknownSubject(_)
            | AuthFailure::WrongSecret(_) => ApiError::Forbidden,
            AuthFailure::Lookup(_) => {
                ApiError::Internal("Could not verify credentials".to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::WrongMethod
            | ApiError::UnsupportedContentType
            | ApiError::ContentTooLarge
            | ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::TasksUnavailable => StatusCode::NOT_FOUND,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::WrongMethod => write!(f, "Wrong method"),
            ApiError::UnsupportedContentType => write!(f, "Wrong content type"),
            ApiError::ContentTooLarge => write!(f, "Content too large"),
            ApiError::InvalidPayload(msg) => write!(f, "Could not parse data: {}", msg),
            ApiError::Unauthorized { .. } => write!(f, "Unauthorized"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::Internal(msg) => write!(f, "{}", msg),
            ApiError::TasksUnavailable => write!(f, "Task lookup failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::UnsupportedContentType => status.into_response(),
            ApiError::Unauthorized { ref challenge } => (
                status,
                [(header::WWW_AUTHENTICATE, challenge.clone())],
                self.to_string(),
            )
                .into_response(),
            ApiError::TasksUnavailable => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                "[]",
            )
                .into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}
