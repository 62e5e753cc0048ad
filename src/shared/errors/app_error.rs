use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Header validation failed: {0}")]
    HeaderValidation(String),

    #[error("Row limit exceeded: file has more than {0} data rows")]
    RowLimitExceeded(usize),

    #[error("Stream read error: {0}")]
    StreamRead(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Rate limit exceeded: {message}")]
    RateLimitError {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream rejected request ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Which retry budget, if any, an error draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Transient failures: connection drops, 5xx, request timeouts.
    General,
    /// Explicit throttling signal (HTTP 429).
    RateLimited,
    /// Permanent for this call.
    Never,
}

impl AppError {
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        AppError::RateLimitError {
            message: message.into(),
            retry_after,
        }
    }

    pub fn retry_class(&self) -> RetryClass {
        match self {
            AppError::ExternalServiceError(_) => RetryClass::General,
            AppError::RateLimitError { .. } => RetryClass::RateLimited,
            AppError::Upstream { status, .. } if *status == 408 || *status >= 500 => {
                RetryClass::General
            }
            _ => RetryClass::Never,
        }
    }

    /// Server supplied wait hint for throttled calls.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AppError::RateLimitError { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::ExternalServiceError("Request timeout".to_string())
        } else if err.is_connect() {
            AppError::ExternalServiceError("Failed to connect to external service".to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                429 => AppError::rate_limited("Too many requests", None),
                404 => AppError::NotFound("External resource not found".to_string()),
                409 => AppError::Conflict(err.to_string()),
                code => AppError::Upstream {
                    status: code,
                    message: err.to_string(),
                },
            }
        } else if err.is_decode() {
            AppError::SerializationError(err.to_string())
        } else {
            AppError::ExternalServiceError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StreamRead(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            AppError::StreamRead(err.to_string())
        } else {
            AppError::SerializationError(err.to_string())
        }
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Configuration(format!("Invalid UUID: {}", err))
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classes() {
        assert_eq!(
            AppError::ExternalServiceError("reset".into()).retry_class(),
            RetryClass::General
        );
        assert_eq!(
            AppError::rate_limited("slow down", None).retry_class(),
            RetryClass::RateLimited
        );
        assert_eq!(
            AppError::Upstream {
                status: 503,
                message: "unavailable".into()
            }
            .retry_class(),
            RetryClass::General
        );
        assert_eq!(
            AppError::Upstream {
                status: 400,
                message: "bad request".into()
            }
            .retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            AppError::NotFound("org".into()).retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            AppError::Timeout("lookup".into()).retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_value(AppError::NotFound("org".into())).unwrap();
        assert_eq!(json["type"], "NotFound");
        assert_eq!(json["message"], "org");
    }
}
