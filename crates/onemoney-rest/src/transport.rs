//! Signed, retrying transport
//!
//! [`Transport::send`] drives one logical operation to completion:
//!
//! 1. Sign the request (fresh timestamp on every attempt)
//! 2. Send it through the configured [`HttpSend`]
//! 3. Classify the outcome: 2xx success, embedded rate limit, API error, or
//!    network error
//! 4. Retry retryable failures after a `Retry-After` hint or the computed
//!    backoff, up to `max_retries` times
//!
//! Both the HTTP call and the backoff sleep race against the caller's
//! cancellation future.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use onemoney_auth::{SignatureResult, Signer};
use reqwest::Url;
use tracing::{debug, instrument, warn};

use crate::api_error::ApiError;
use crate::error::{RestError, RestResult};
use crate::hooks::{RequestInfo, RetryInfo, TransportHooks};
use crate::request::{Request, Response};
use crate::retry::RetryConfig;
use crate::sender::HttpSend;

/// Header carrying the signed timestamp
pub const DATE_HEADER: &str = "x-om-date";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Default `User-Agent`: `onemoney-rust-sdk/<version> (rust/<rustc version>; <os>/<arch>)`
///
/// The rust version is the compiler that built this crate, captured by the
/// build script.
pub fn default_user_agent() -> String {
    format!(
        "onemoney-rust-sdk/{} (rust/{}; {}/{})",
        env!("CARGO_PKG_VERSION"),
        env!("ONEMONEY_RUSTC_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

/// Executes signed requests against the 1Money API
///
/// Clones share the same sender (and its connection pool). All per-call state
/// lives on the stack of [`Transport::send`], so one transport can serve many
/// tasks at once.
#[derive(Clone)]
pub struct Transport {
    base_url: Url,
    signer: Signer,
    sender: Arc<dyn HttpSend>,
    retry: RetryConfig,
    user_agent: String,
    hooks: TransportHooks,
}

impl Transport {
    /// Create a transport
    ///
    /// # Errors
    /// Returns [`RestError::Config`] if `base_url` is not an absolute URL.
    pub fn new(
        base_url: &str,
        signer: Signer,
        sender: impl HttpSend,
        retry: RetryConfig,
    ) -> RestResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| RestError::Config(format!("base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RestError::Config(format!("base URL: {} is not a base", base_url)));
        }

        Ok(Self {
            base_url,
            signer,
            sender: Arc::new(sender),
            retry,
            user_agent: default_user_agent(),
            hooks: TransportHooks::default(),
        })
    }

    /// Override the `User-Agent` header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Install observability hooks
    pub fn with_hooks(mut self, hooks: TransportHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Retry policy in effect
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Send a request, retrying transient failures
    pub async fn send(&self, request: &Request) -> RestResult<Response> {
        self.send_until(request, std::future::pending()).await
    }

    /// Send a request, giving up as soon as `cancel` completes
    ///
    /// `cancel` can be any future: a shutdown signal, a deadline
    /// (`tokio::time::sleep_until`), a oneshot receiver. Completion aborts an
    /// in-flight HTTP call or backoff sleep and yields [`RestError::Cancelled`].
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn send_until<F>(&self, request: &Request, cancel: F) -> RestResult<Response>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let retry = &self.retry;
        let url = self.build_url(request)?;
        let mut attempt: u32 = 0;
        let mut pending_delay: Option<Duration> = None;

        loop {
            if let Some(delay) = pending_delay.take() {
                tokio::select! {
                    biased;
                    _ = &mut cancel => {
                        debug!(attempt, "cancelled during backoff");
                        return Err(RestError::Cancelled);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let result = tokio::select! {
                biased;
                _ = &mut cancel => {
                    debug!(attempt, "cancelled");
                    return Err(RestError::Cancelled);
                }
                result = self.attempt(request, &url, attempt) => result,
            };

            let err = match result {
                Ok(response) => {
                    debug!(attempt, status = response.status_code, "request succeeded");
                    return Ok(response);
                }
                Err(err) => err,
            };

            if !retry.should_retry(attempt) || !self.is_retryable(&err) {
                debug!(attempt, error = %err, "request failed");
                self.hooks.invoke_error(&err);
                return Err(err);
            }

            let (delay, server_hint) = self.retry_delay(&err, attempt);
            attempt += 1;

            warn!(
                attempt,
                max_retries = retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                server_hint,
                error = %err,
                "retrying request"
            );
            self.hooks.invoke_retry(&RetryInfo {
                attempt,
                delay,
                server_hint,
                reason: err.to_string(),
            });

            pending_delay = Some(delay);
        }
    }

    /// One signed wire attempt
    async fn attempt(&self, request: &Request, url: &Url, attempt: u32) -> RestResult<Response> {
        let signature = self
            .signer
            .sign(request.method.as_str(), url.path(), &request.body)?;
        let http_request = self.build_http_request(request, url, &signature)?;

        self.hooks.invoke_request(&RequestInfo {
            method: request.method.to_string(),
            path: url.path().to_string(),
            attempt,
        });

        let http_response = self.sender.http_send(http_request).await?;
        let (parts, body) = http_response.into_parts();

        if parts.status.is_success() {
            if let Some(err) = ApiError::from_embedded_rate_limit(&parts.headers, &body) {
                debug!("rate limit embedded in {} response", parts.status.as_u16());
                return Err(err.into());
            }

            return Ok(Response {
                status_code: parts.status.as_u16(),
                status_text: parts.status.canonical_reason().unwrap_or_default().to_string(),
                body,
                headers: parts.headers,
            });
        }

        Err(ApiError::from_response(parts.status, &parts.headers, &body).into())
    }

    fn is_retryable(&self, err: &RestError) -> bool {
        match err {
            RestError::Api(api) => self.retry.is_retryable_status(api.status_code),
            RestError::Network(_) => true,
            _ => false,
        }
    }

    /// Server hint wins over computed backoff
    fn retry_delay(&self, err: &RestError, attempt: u32) -> (Duration, bool) {
        match err.api_error().and_then(|api| api.retry_after) {
            Some(hint) => (hint, true),
            None => (self.retry.calculate_backoff(attempt), false),
        }
    }

    fn build_url(&self, request: &Request) -> RestResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = request.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| RestError::InvalidRequest(format!("path {:?}: {}", request.path, e)))?;

        if url.query().is_some() || url.fragment().is_some() {
            return Err(RestError::InvalidRequest(format!(
                "path {:?} must not contain a query or fragment",
                request.path
            )));
        }

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    fn build_http_request(
        &self,
        request: &Request,
        url: &Url,
        signature: &SignatureResult,
    ) -> RestResult<http::Request<Bytes>> {
        let mut http_request = http::Request::builder()
            .method(request.method.clone())
            .uri(url.as_str())
            .body(request.body.clone())
            .map_err(|e| RestError::InvalidRequest(e.to_string()))?;

        let headers = http_request.headers_mut();
        headers.insert(AUTHORIZATION, header_value(&signature.authorization)?);
        headers.insert(
            HeaderName::from_static(DATE_HEADER),
            header_value(&signature.timestamp)?,
        );
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        if request.has_body() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RestError::InvalidRequest(format!("header {:?}: {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }

        Ok(http_request)
    }
}

fn header_value(value: &str) -> RestResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| RestError::InvalidRequest(e.to_string()))
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("signer", &self.signer)
            .field("retry", &self.retry)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}
