use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Errors surfaced by the matching and search engines
///
/// Upstream variants carry a caller-safe message only; raw backend detail is
/// logged where the failure is observed and never leaves the process.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UpstreamTimeout(String),

    #[error("{0}")]
    Upstream(String),
}

/// Tag used in error payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UpstreamTimeout,
    Upstream,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::Upstream => "upstream",
        }
    }
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::UpstreamTimeout(_) => ErrorKind::UpstreamTimeout,
            EngineError::Upstream(_) => ErrorKind::Upstream,
        }
    }

    /// Timeouts may succeed on a later attempt; everything else is terminal
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::UpstreamTimeout(_))
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            kind: self.kind().as_str().to_string(),
        }
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            EngineError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_response())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
