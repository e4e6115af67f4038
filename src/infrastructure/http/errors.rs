use reqwest::StatusCode;
use thiserror::Error;

/// Errors from a vision-model provider API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Forbidden - permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Model or endpoint not found (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// Server error (HTTP 5xx, 529)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Any other status
    #[error("Unexpected status ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl ApiError {
    /// Map a non-success status and its body onto an error.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 => Self::InvalidApiKey,
            403 => Self::Forbidden(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimitExceeded,
            500..=599 => Self::ServerError(status, body),
            _ => Self::UnknownError(status, body),
        }
    }

    /// Returns true if this error is transient and should be retried
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_, _) | Self::Timeout | Self::NetworkError(_)
        )
    }

    /// Returns true if this is a permanent error that should not be retried
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::InvalidApiKey | Self::Forbidden(_) | Self::NotFound(_)
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ApiError::RateLimitExceeded
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ApiError::InvalidApiKey
        ));
        assert!(ApiError::from_status(StatusCode::from_u16(529).unwrap(), "overloaded".into())
            .is_transient());
        assert!(ApiError::from_status(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert!(ApiError::from_status(StatusCode::NOT_FOUND, String::new()).is_permanent());
    }

    #[test]
    fn test_error_exclusivity() {
        let rate_limit_error = ApiError::RateLimitExceeded;
        assert!(rate_limit_error.is_transient());
        assert!(!rate_limit_error.is_permanent());

        let invalid_request_error = ApiError::InvalidRequest("test".to_string());
        assert!(!invalid_request_error.is_transient());
        assert!(invalid_request_error.is_permanent());

        let malformed = ApiError::MalformedResponse("no choices".to_string());
        assert!(!malformed.is_transient());
        assert!(!malformed.is_permanent());
    }
}
