//! Error types for signing operations

/// Errors that can occur while preparing a request signature
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The secret key is not valid base64url once padded
    #[error("invalid secret key encoding: {0}")]
    InvalidSecretKey(#[from] base64::DecodeError),

    /// The access key is empty
    #[error("access key must not be empty")]
    EmptyAccessKey,

    /// The secret key decodes to zero bytes
    #[error("secret key must not be empty")]
    EmptySecretKey,

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),
}

/// Result type for signing operations
pub type AuthResult<T> = Result<T, AuthError>;
