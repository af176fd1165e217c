use async_openai::error::OpenAIError;
use thiserror::Error;
use tracing::warn;

/// Whether retrying the same call later can reasonably succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
}

/// Failure of a single language service call.
///
/// The service never retries on its own. Callers surface the error and leave
/// the triggering operation retryable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("request timed out")]
    Timeout,
    #[error("could not connect to the language service")]
    Connection,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("language service is unavailable")]
    Unavailable,
    #[error("operation cancelled")]
    Cancelled,
    #[error("language service returned no text")]
    EmptyResponse,
    #[error("API key invalid or expired")]
    Authentication,
    #[error("request not permitted for this API key")]
    Permission,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Timeout
            | ServiceError::Connection
            | ServiceError::RateLimited
            | ServiceError::Unavailable
            | ServiceError::Cancelled
            | ServiceError::EmptyResponse => ErrorKind::Transient,
            ServiceError::Authentication
            | ServiceError::Permission
            | ServiceError::InvalidRequest(_) => ErrorKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<OpenAIError> for ServiceError {
    fn from(err: OpenAIError) -> Self {
        let classified = match &err {
            OpenAIError::Reqwest(inner) => {
                if inner.is_timeout() {
                    ServiceError::Timeout
                } else if let Some(status) = inner.status() {
                    from_status(status.as_u16())
                } else {
                    ServiceError::Connection
                }
            }
            OpenAIError::ApiError(api) => classify_api_error(api.r#type.as_deref(), &api.message),
            OpenAIError::InvalidArgument(message) => ServiceError::InvalidRequest(message.clone()),
            _ => ServiceError::Unavailable,
        };
        warn!(error = %err, kind = ?classified.kind(), "language service call failed");
        classified
    }
}

pub(crate) fn from_status(status: u16) -> ServiceError {
    match status {
        401 => ServiceError::Authentication,
        403 => ServiceError::Permission,
        408 => ServiceError::Timeout,
        429 => ServiceError::RateLimited,
        400..=499 => ServiceError::InvalidRequest(format!("HTTP {status}")),
        _ => ServiceError::Unavailable,
    }
}

pub(crate) fn classify_api_error(error_type: Option<&str>, message: &str) -> ServiceError {
    match error_type.unwrap_or_default() {
        "invalid_api_key" | "authentication_error" => ServiceError::Authentication,
        "permission_error" | "insufficient_permissions" => ServiceError::Permission,
        "rate_limit_exceeded" | "insufficient_quota" | "requests" | "tokens" => {
            ServiceError::RateLimited
        }
        "invalid_request_error" if message.contains("API key") => ServiceError::Authentication,
        "invalid_request_error" => ServiceError::InvalidRequest(message.to_string()),
        _ => ServiceError::Unavailable,
    }
}
