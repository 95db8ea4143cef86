//! REST transport for the 1Money API
//!
//! This crate owns the part of the SDK that talks to the network: it signs
//! every attempt, sends it, classifies failures into a typed error taxonomy,
//! and retries transient failures with exponential backoff.
//!
//! # Example
//!
//! ```no_run
//! use onemoney_rest::OneMoneyClient;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Asset {
//!     asset: String,
//!     available_amount: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OneMoneyClient::from_env()?;
//!     let assets: Vec<Asset> = client.get_json("/v1/customers/cus_123/assets", &[]).await?;
//!     println!("{:?}", assets);
//!     Ok(())
//! }
//! ```
//!
//! # Retries
//!
//! By default 429, 502, 503 and 504 responses and network failures are retried
//! up to three times. A `Retry-After` hint from the server overrides the
//! computed backoff. Requests are re-signed on every attempt and the body bytes
//! are resent unchanged, so write operations should carry an idempotency key
//! (see [`Request::with_idempotency_key`]).

pub mod api_error;
pub mod client;
pub mod error;
pub mod hooks;
pub mod sender;
pub mod request;
pub mod retry;
pub mod transport;

// Re-export main types
pub use api_error::{ApiError, ApiErrorKind};
pub use client::{ClientConfig, OneMoneyClient};
pub use error::{NetworkError, RestError, RestResult};
pub use hooks::TransportHooks;
pub use sender::{HttpSend, ReqwestHttpSend};
pub use request::{Request, Response};
pub use retry::RetryConfig;
pub use transport::Transport;

pub use onemoney_auth::{Credentials, Signer};
