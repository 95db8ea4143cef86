//! API credentials for the 1Money REST API
//!
//! # Security
//!
//! Secret keys are stored using the `secrecy` crate which:
//! - Zeroizes memory on drop
//! - Prevents accidental logging via Debug impl
//! - Provides explicit access via `expose_secret()`

use base64::{engine::general_purpose::URL_SAFE, Engine};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{AuthError, AuthResult};

const ACCESS_KEY_ENV: &str = "ONEMONEY_ACCESS_KEY";
const SECRET_KEY_ENV: &str = "ONEMONEY_SECRET_KEY";

/// Long-lived access/secret key pair
///
/// The secret key is kept in its stored form: base64url without padding.
/// It is only decoded when a signature is computed.
pub struct Credentials {
    /// Access key (public, sent in the `Authorization` header)
    access_key: String,
    /// Secret key, base64url encoded without padding (zeroized on drop)
    secret_key: SecretString,
}

impl Credentials {
    /// Create new credentials from an access key and a secret key
    ///
    /// # Arguments
    /// * `access_key` - Your 1Money access key
    /// * `secret_key` - Your secret key (base64url, padding stripped)
    ///
    /// The secret key encoding is not checked here; use [`Credentials::validate`]
    /// to fail early.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> AuthResult<Self> {
        let access_key = access_key.into();
        if access_key.is_empty() {
            return Err(AuthError::EmptyAccessKey);
        }

        Ok(Self {
            access_key,
            secret_key: SecretString::from(secret_key.into()),
        })
    }

    /// Create credentials from environment variables
    ///
    /// Reads `ONEMONEY_ACCESS_KEY` and `ONEMONEY_SECRET_KEY` from the environment.
    pub fn from_env() -> AuthResult<Self> {
        let access_key = std::env::var(ACCESS_KEY_ENV)
            .map_err(|_| AuthError::EnvVarNotSet(ACCESS_KEY_ENV.to_string()))?;
        let secret_key = std::env::var(SECRET_KEY_ENV)
            .map_err(|_| AuthError::EnvVarNotSet(SECRET_KEY_ENV.to_string()))?;

        Self::new(access_key, secret_key)
    }

    /// Get the access key
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Decode the secret key into raw HMAC key bytes
    pub(crate) fn signing_key(&self) -> AuthResult<Vec<u8>> {
        let padded = pad_base64url(self.secret_key.expose_secret());
        let key = URL_SAFE.decode(padded)?;
        if key.is_empty() {
            return Err(AuthError::EmptySecretKey);
        }
        Ok(key)
    }

    /// Check that the secret key decodes to a usable signing key
    pub fn validate(&self) -> AuthResult<()> {
        self.signing_key().map(|_| ())
    }
}

/// Append the `=` padding a base64url string needs to be decodable
///
/// A length of `1 mod 4` gets three characters and still will not decode:
/// a single trailing symbol cannot carry a whole byte.
pub fn pad_base64url(encoded: &str) -> String {
    let padding = (4 - encoded.len() % 4) % 4;
    let mut padded = String::with_capacity(encoded.len() + padding);
    padded.push_str(encoded);
    padded.extend(std::iter::repeat('=').take(padding));
    padded
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            access_key: self.access_key.clone(),
            secret_key: SecretString::from(self.secret_key.expose_secret().to_string()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
