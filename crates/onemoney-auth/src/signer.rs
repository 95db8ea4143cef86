//! Canonical-string HMAC-SHA256 request signer
//!
//! 1Money signature algorithm:
//! 1. timestamp = UTC now as `YYYYMMDDTHHMMSSZ`
//! 2. body_hash = hex(SHA256(body))
//! 3. canonical = access_key \n timestamp \n METHOD \n path \n body_hash
//! 4. signature = hex(HMAC-SHA256(decoded_secret, canonical))
//! 5. `Authorization: OneMoney-HMAC-SHA256 <access_key>:<timestamp>:<signature>`

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::credentials::Credentials;
use crate::error::AuthResult;

type HmacSha256 = Hmac<Sha256>;

/// Scheme name that prefixes the `Authorization` header value
pub const SIGNING_ALGORITHM: &str = "OneMoney-HMAC-SHA256";

/// `chrono` format string for the signing timestamp (basic ISO-8601)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Source of the current time used in signatures
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for reproducible signatures
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Output of one signing call
///
/// Valid for a single wire attempt only. A retry must sign again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureResult {
    /// Full `Authorization` header value
    pub authorization: String,
    /// Timestamp that was signed, sent as `X-OM-Date`
    pub timestamp: String,
    /// Lowercase hex SHA-256 of the request body
    pub body_hash: String,
}

/// Signs requests with a fixed set of credentials
///
/// Holds no mutable state, so a single signer can be shared across tasks.
#[derive(Clone)]
pub struct Signer {
    credentials: Credentials,
    clock: Arc<dyn Clock>,
}

impl Signer {
    /// Create a signer that stamps requests with the system clock
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for timestamps
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Get the access key
    pub fn access_key(&self) -> &str {
        self.credentials.access_key()
    }

    /// Sign one request
    ///
    /// # Arguments
    /// * `method` - HTTP method, any case
    /// * `path` - URL path without query string
    /// * `body` - Raw request body, may be empty
    ///
    /// # Errors
    /// Fails when the secret key is not decodable base64url or decodes to
    /// an empty key.
    pub fn sign(&self, method: &str, path: &str, body: &[u8]) -> AuthResult<SignatureResult> {
        let key = self.credentials.signing_key()?;

        let timestamp = self.clock.now().format(TIMESTAMP_FORMAT).to_string();
        let body_hash = hex::encode(Sha256::digest(body));
        let canonical = self.canonical_string(method, path, &timestamp, &body_hash);

        let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        trace!(method, path, timestamp = %timestamp, "signed request");

        Ok(SignatureResult {
            authorization: format!(
                "{} {}:{}:{}",
                SIGNING_ALGORITHM,
                self.credentials.access_key(),
                timestamp,
                signature
            ),
            timestamp,
            body_hash,
        })
    }

    /// Build the newline-joined string that gets signed
    pub fn canonical_string(
        &self,
        method: &str,
        path: &str,
        timestamp: &str,
        body_hash: &str,
    ) -> String {
        [
            self.credentials.access_key(),
            timestamp,
            &method.to_ascii_uppercase(),
            path,
            body_hash,
        ]
        .join("\n")
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::error::AuthError;
    use pretty_assertions::{assert_eq, assert_ne};

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn fixed_signer() -> Signer {
        // "secret-signing-key" base64url encoded, padding stripped
        let creds = Credentials::new("AK_TEST", "c2VjcmV0LXNpZ25pbmcta2V5").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 2).unwrap();
        Signer::new(creds).with_clock(FixedClock(at))
    }

    fn signature_part(authorization: &str) -> &str {
        authorization.rsplit(':').next().unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        let result = fixed_signer().sign("GET", "/v1/assets", b"").unwrap();
        assert_eq!(result.timestamp, "20240305T070902Z");
    }

    #[test]
    fn test_empty_body_hash() {
        let result = fixed_signer().sign("GET", "/v1/assets", b"").unwrap();
        assert_eq!(result.body_hash, EMPTY_SHA256);
    }

    #[test]
    fn test_authorization_layout() {
        let result = fixed_signer().sign("get", "/v1/assets", b"").unwrap();
        let prefix = "OneMoney-HMAC-SHA256 AK_TEST:20240305T070902Z:";
        assert!(result.authorization.starts_with(prefix));

        let signature = signature_part(&result.authorization);
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_matches_manual_hmac() {
        let signer = fixed_signer();
        let body = br#"{"amount":"10.00"}"#;
        let result = signer.sign("post", "/v1/withdrawals", body).unwrap();

        let body_hash = hex::encode(Sha256::digest(body));
        let canonical = format!(
            "AK_TEST\n20240305T070902Z\nPOST\n/v1/withdrawals\n{}",
            body_hash
        );
        let mut mac = HmacSha256::new_from_slice(b"secret-signing-key").unwrap();
        mac.update(canonical.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(result.body_hash, body_hash);
        assert_eq!(signature_part(&result.authorization), expected);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = fixed_signer();
        let first = signer.sign("POST", "/v1/conversions", b"{}").unwrap();
        let second = signer.sign("POST", "/v1/conversions", b"{}").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_method_is_uppercased() {
        let signer = fixed_signer();
        let lower = signer.sign("post", "/v1/conversions", b"{}").unwrap();
        let upper = signer.sign("POST", "/v1/conversions", b"{}").unwrap();
        assert_eq!(lower.authorization, upper.authorization);
    }

    #[test]
    fn test_each_field_changes_signature() {
        let signer = fixed_signer();
        let base = signer.sign("GET", "/v1/assets", b"").unwrap().authorization;

        let method = signer.sign("POST", "/v1/assets", b"").unwrap().authorization;
        let path = signer.sign("GET", "/v1/balances", b"").unwrap().authorization;
        let body = signer.sign("GET", "/v1/assets", b"x").unwrap().authorization;

        assert_ne!(base, method);
        assert_ne!(base, path);
        assert_ne!(base, body);
    }

    #[test]
    fn test_canonical_field_order() {
        let signer = fixed_signer();
        let canonical = signer.canonical_string("put", "/v1/rules", "20240305T070902Z", "abcd");
        assert_eq!(canonical, "AK_TEST\n20240305T070902Z\nPUT\n/v1/rules\nabcd");

        // Equal-length values in swapped positions must not collide
        let swapped = signer.canonical_string("GET", "/abc", "20240305T070902Z", "/xyz");
        let original = signer.canonical_string("GET", "/xyz", "20240305T070902Z", "/abc");
        assert_ne!(swapped, original);
    }

    #[test]
    fn test_clock_changes_timestamp_and_signature() {
        let creds = Credentials::new("AK_TEST", "c2VjcmV0LXNpZ25pbmcta2V5").unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 2).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 3).unwrap();

        let a = Signer::new(creds.clone()).with_clock(FixedClock(early));
        let b = Signer::new(creds).with_clock(FixedClock(late));

        let a = a.sign("GET", "/v1/assets", b"").unwrap();
        let b = b.sign("GET", "/v1/assets", b"").unwrap();
        assert_ne!(a.timestamp, b.timestamp);
        assert_ne!(a.authorization, b.authorization);
    }

    #[test]
    fn test_malformed_secret_fails_to_sign() {
        let creds = Credentials::new("AK_TEST", "abcde").unwrap();
        let signer = Signer::new(creds);
        let err = signer.sign("GET", "/v1/assets", b"").unwrap_err();
        assert!(matches!(err, AuthError::InvalidSecretKey(_)));
    }

    #[test]
    fn test_empty_secret_fails_to_sign() {
        let creds = Credentials::new("AK_TEST", "").unwrap();
        let err = Signer::new(creds).sign("GET", "/v1/assets", b"").unwrap_err();
        assert!(matches!(err, AuthError::EmptySecretKey));
    }

    #[test]
    fn test_signer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Signer>();
    }
}
