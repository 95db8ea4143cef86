//! Error types for REST operations

use onemoney_auth::AuthError;

use crate::api_error::ApiError;

/// A failure where no HTTP response was received
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct NetworkError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl NetworkError {
    /// Create a network error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            "HTTP transport failure".to_string()
        };
        Self::new(message).with_source(err)
    }
}

/// Errors that can occur during REST API operations
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The API answered with an error (or an embedded rate limit)
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// No response was received
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The request could not be signed
    #[error("failed to sign request: {0}")]
    Signing(#[from] AuthError),

    /// The caller cancelled the operation
    #[error("request cancelled")]
    Cancelled,

    /// The request could not be turned into a valid HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to (de)serialize a JSON payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RestError {
    /// Get the API error, if this is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of the API error, if any
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|e| e.status_code)
    }

    /// Check if this error is worth retrying under the default policy
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(err) => err.is_retryable(),
            Self::Network(_) => true,
            _ => false,
        }
    }

    /// Check if this is a 401
    pub fn is_auth_error(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_auth_error)
    }

    /// Check if this is a 403
    pub fn is_forbidden(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_forbidden)
    }

    /// Check if this is a 404
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }

    /// Check if this is a 422
    pub fn is_validation_error(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_validation_error)
    }

    /// Check if this error indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_rate_limited)
    }

    /// Check if this is a 5xx
    pub fn is_server_error(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_server_error)
    }

    /// Check if this is a 4xx
    pub fn is_client_error(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_client_error)
    }

    /// Check if no response was received
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Check if the caller cancelled the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;
