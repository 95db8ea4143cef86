//! Observability hooks for the request lifecycle
//!
//! Hooks let an application observe attempts, retries and failures without
//! installing a global logger. They run synchronously inside the transport,
//! so keep them fast.
//!
//! # Example
//!
//! ```
//! use onemoney_rest::hooks::TransportHooks;
//!
//! let hooks = TransportHooks::new()
//!     .on_request(|info| {
//!         println!("{} {} (attempt {})", info.method, info.path, info.attempt);
//!     })
//!     .on_retry(|info| {
//!         println!("retry {} in {:?}: {}", info.attempt, info.delay, info.reason);
//!     });
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::RestError;

/// An attempt about to go on the wire
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// HTTP method
    pub method: String,
    /// Signed path
    pub path: String,
    /// Attempt number (0 = first attempt)
    pub attempt: u32,
}

/// A retry that has been scheduled
#[derive(Debug, Clone)]
pub struct RetryInfo {
    /// Retry number (1 = first retry)
    pub attempt: u32,
    /// Delay before the retry
    pub delay: Duration,
    /// Whether the delay came from a server `Retry-After` hint
    pub server_hint: bool,
    /// Display form of the error that triggered the retry
    pub reason: String,
}

/// Callback for an attempt about to be sent
pub type RequestHook = Arc<dyn Fn(&RequestInfo) + Send + Sync>;
/// Callback for a scheduled retry
pub type RetryHook = Arc<dyn Fn(&RetryInfo) + Send + Sync>;
/// Callback for the terminal error of a call
pub type ErrorHook = Arc<dyn Fn(&RestError) + Send + Sync>;

/// Observability hooks container
///
/// All hooks are optional and shared between transport clones.
#[derive(Clone, Default)]
pub struct TransportHooks {
    /// Called before each wire attempt, retries included
    pub(crate) on_request: Option<RequestHook>,
    /// Called when a retry is scheduled, before the backoff sleep
    pub(crate) on_retry: Option<RetryHook>,
    /// Called once with the error a call gives up on
    pub(crate) on_error: Option<ErrorHook>,
}

impl fmt::Debug for TransportHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHooks")
            .field("on_request", &self.on_request.as_ref().map(|_| "..."))
            .field("on_retry", &self.on_retry.as_ref().map(|_| "..."))
            .field("on_error", &self.on_error.as_ref().map(|_| "..."))
            .finish()
    }
}

impl TransportHooks {
    /// Create a new empty hooks container
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked before every wire attempt
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestInfo) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked when a retry is scheduled
    ///
    /// Called before the backoff sleep starts.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&RetryInfo) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(f));
        self
    }

    /// Register a callback for the terminal error of a call
    ///
    /// Not called for cancellation.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&RestError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn invoke_request(&self, info: &RequestInfo) {
        if let Some(ref hook) = self.on_request {
            hook(info);
        }
    }

    pub(crate) fn invoke_retry(&self, info: &RetryInfo) {
        if let Some(ref hook) = self.on_retry {
            hook(info);
        }
    }

    pub(crate) fn invoke_error(&self, err: &RestError) {
        if let Some(ref hook) = self.on_error {
            hook(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_hooks_invoke() {
        let retries = Arc::new(AtomicU32::new(0));
        let counter = retries.clone();
        let hooks = TransportHooks::new().on_retry(move |info| {
            counter.fetch_add(info.attempt, Ordering::SeqCst);
        });

        hooks.invoke_retry(&RetryInfo {
            attempt: 2,
            delay: Duration::from_millis(10),
            server_hint: false,
            reason: "503".to_string(),
        });
        assert_eq!(retries.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_hooks_are_noops() {
        let hooks = TransportHooks::new();
        hooks.invoke_error(&RestError::Cancelled);
        hooks.invoke_request(&RequestInfo {
            method: "GET".to_string(),
            path: "/v1/assets".to_string(),
            attempt: 0,
        });
        let debug = format!("{:?}", hooks);
        for field in ["on_request: None", "on_retry: None", "on_error: None"] {
            assert!(debug.contains(field), "{debug}");
        }
    }
}
