//! Common test utilities for transport tests
//!
//! `MockSender` replays a scripted list of outcomes and records every request
//! it receives, so tests can count attempts and inspect headers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use http::{HeaderMap, StatusCode};
use onemoney_auth::{Credentials, FixedClock, Signer};
use onemoney_rest::{HttpSend, NetworkError, RetryConfig, Transport};
use parking_lot::Mutex;

pub const BASE_URL: &str = "https://api.test.1money.com";

/// "secret-signing-key", base64url without padding
pub const SECRET_KEY: &str = "c2VjcmV0LXNpZ25pbmcta2V5";
pub const ACCESS_KEY: &str = "AK_TEST";

/// Embedded rate limit body as the API sends it
pub const EMBEDDED_RATE_LIMIT: &str =
    r#"{"code":"Too_Many_Requests","status":429,"detail":"Retry after 4s."}"#;

/// One scripted outcome
#[derive(Clone)]
pub enum Scripted {
    Respond {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: &'static str,
    },
    Fail(&'static str),
}

impl Scripted {
    pub fn status(status: u16, body: &'static str) -> Self {
        Self::Respond {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(status: u16, name: &'static str, value: &'static str, body: &'static str) -> Self {
        Self::Respond {
            status,
            headers: vec![(name, value)],
            body,
        }
    }
}

/// A request captured by the mock
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
struct State {
    script: VecDeque<Scripted>,
    /// Replayed once the script runs out
    fallback: Option<Scripted>,
    captured: Vec<Captured>,
}

/// Scripted [`HttpSend`] implementation
#[derive(Clone, Default)]
pub struct MockSender {
    state: Arc<Mutex<State>>,
}

impl MockSender {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        let sender = Self::default();
        sender.state.lock().script = script.into_iter().collect();
        sender
    }

    /// Answer every request with the same outcome
    pub fn always(outcome: Scripted) -> Self {
        let sender = Self::default();
        sender.state.lock().fallback = Some(outcome);
        sender
    }

    pub fn calls(&self) -> usize {
        self.state.lock().captured.len()
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.state.lock().captured.clone()
    }
}

#[async_trait]
impl HttpSend for MockSender {
    async fn http_send(
        &self,
        req: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, NetworkError> {
        let outcome = {
            let mut state = self.state.lock();
            state.captured.push(Captured {
                method: req.method().to_string(),
                uri: req.uri().to_string(),
                headers: req.headers().clone(),
                body: req.body().clone(),
            });
            state
                .script
                .pop_front()
                .or_else(|| state.fallback.clone())
                .unwrap_or(Scripted::Fail("script exhausted"))
        };

        match outcome {
            Scripted::Fail(message) => Err(NetworkError::new(message)),
            Scripted::Respond {
                status,
                headers,
                body,
            } => {
                let mut response = http::Response::new(Bytes::from_static(body.as_bytes()));
                *response.status_mut() = StatusCode::from_u16(status).unwrap();
                for (name, value) in headers {
                    response.headers_mut().insert(name, value.parse().unwrap());
                }
                Ok(response)
            }
        }
    }
}

/// Signer frozen at 2024-03-05T07:09:02Z
pub fn fixed_signer() -> Signer {
    let creds = Credentials::new(ACCESS_KEY, SECRET_KEY).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 2).unwrap();
    Signer::new(creds).with_clock(FixedClock(at))
}

/// Retry policy with predictable delays
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig::new()
        .with_max_retries(max_retries)
        .with_initial_backoff(std::time::Duration::from_millis(100))
        .with_max_backoff(std::time::Duration::from_secs(5))
        .with_jitter(false)
}

pub fn transport(sender: MockSender, retry: RetryConfig) -> Transport {
    Transport::new(BASE_URL, fixed_signer(), sender, retry).unwrap()
}
