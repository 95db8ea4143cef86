//! Request signing for the 1Money REST API
//!
//! Every authenticated request carries an `Authorization` header derived from
//! an HMAC-SHA256 signature over a canonical string, plus the timestamp that
//! went into that signature.
//!
//! # Example
//!
//! ```no_run
//! use onemoney_auth::{Credentials, Signer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load credentials from environment
//!     let creds = Credentials::from_env()?;
//!     let signer = Signer::new(creds);
//!
//!     let signature = signer.sign("GET", "/v1/customers", b"")?;
//!     println!("Authorization: {}", signature.authorization);
//!     println!("X-OM-Date: {}", signature.timestamp);
//!
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod signer;

pub use credentials::{pad_base64url, Credentials};
pub use error::{AuthError, AuthResult};
pub use signer::{
    Clock, FixedClock, SignatureResult, Signer, SystemClock, SIGNING_ALGORITHM,
    TIMESTAMP_FORMAT,
};
