//! Typed JSON client on top of [`Transport`]
//!
//! Per-resource service wrappers only need to pick a method, a path and the
//! request/response types; everything else goes through these helpers.

use std::time::Duration;

use onemoney_auth::{Credentials, Signer};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::{RestError, RestResult};
use crate::hooks::TransportHooks;
use crate::request::{Request, Response};
use crate::retry::RetryConfig;
use crate::sender::{HttpSend, ReqwestHttpSend};
use crate::transport::Transport;

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.1money.com";

/// Sandbox API endpoint
pub const SANDBOX_BASE_URL: &str = "https://api.sandbox.1money.com";

/// Default per-attempt request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const BASE_URL_ENV: &str = "ONEMONEY_BASE_URL";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API credentials
    pub credentials: Credentials,
    /// Base URL requests are resolved against
    pub base_url: String,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Custom user agent
    pub user_agent: Option<String>,
    /// Retry policy
    pub retry: RetryConfig,
    /// Observability hooks
    pub hooks: TransportHooks,
}

impl ClientConfig {
    /// Create a configuration for the production endpoint
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            retry: RetryConfig::default(),
            hooks: TransportHooks::default(),
        }
    }

    /// Create a configuration from environment variables
    ///
    /// Credentials come from `ONEMONEY_ACCESS_KEY` / `ONEMONEY_SECRET_KEY`; the
    /// base URL from `ONEMONEY_BASE_URL` when set.
    pub fn from_env() -> RestResult<Self> {
        let credentials = Credentials::from_env().map_err(|e| RestError::Config(e.to_string()))?;
        let mut config = Self::new(credentials);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Set base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use the sandbox endpoint
    pub fn sandbox(self) -> Self {
        self.with_base_url(SANDBOX_BASE_URL)
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set observability hooks
    pub fn with_hooks(mut self, hooks: TransportHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// 1Money REST API client
///
/// # Example
///
/// ```no_run
/// use onemoney_rest::{ClientConfig, Credentials, OneMoneyClient, RetryConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let creds = Credentials::new("ak_live_123", "c2VjcmV0")?;
/// let config = ClientConfig::new(creds)
///     .sandbox()
///     .with_retry(RetryConfig::new().with_max_retries(5));
/// let client = OneMoneyClient::new(config)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OneMoneyClient {
    transport: Transport,
}

impl OneMoneyClient {
    /// Create a client backed by `reqwest`
    pub fn new(config: ClientConfig) -> RestResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RestError::Config(format!("HTTP client: {}", e)))?;

        Self::with_sender(config, ReqwestHttpSend::new(http_client))
    }

    /// Create a client from environment variables
    pub fn from_env() -> RestResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client with a custom HTTP sender
    pub fn with_sender(config: ClientConfig, sender: impl HttpSend) -> RestResult<Self> {
        let signer = Signer::new(config.credentials);
        let mut transport = Transport::new(&config.base_url, signer, sender, config.retry)?
            .with_hooks(config.hooks);
        if let Some(user_agent) = config.user_agent {
            transport = transport.with_user_agent(user_agent);
        }

        info!(base_url = %transport.base_url(), "Created 1Money REST client");

        Ok(Self { transport })
    }

    /// Underlying transport
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Send a prepared request
    pub async fn send(&self, request: &Request) -> RestResult<Response> {
        self.transport.send(request).await
    }

    /// Send a request and decode the JSON response
    pub async fn request_json<T: DeserializeOwned>(&self, request: &Request) -> RestResult<T> {
        self.transport.send(request).await?.json()
    }

    /// GET with query parameters
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> RestResult<T> {
        let request = query
            .iter()
            .fold(Request::get(path), |req, (k, v)| req.with_query(*k, *v));
        self.request_json(&request).await
    }

    /// POST a JSON body
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> RestResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(&Request::post(path).with_json(body)?).await
    }

    /// POST a JSON body with an idempotency key
    pub async fn post_json_idempotent<B, T>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: &str,
    ) -> RestResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = Request::post(path)
            .with_json(body)?
            .with_idempotency_key(idempotency_key);
        self.request_json(&request).await
    }

    /// PUT a JSON body
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> RestResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(&Request::put(path).with_json(body)?).await
    }

    /// DELETE a resource
    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> RestResult<T> {
        self.request_json(&Request::delete(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("AK_TEST", "c2VjcmV0").unwrap()
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new(creds())
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent")
            .with_retry(RetryConfig::disabled());

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, Some("test-agent".to_string()));
        assert_eq!(config.retry.max_retries, 0);
    }

    #[test]
    fn test_sandbox() {
        let config = ClientConfig::new(creds()).sandbox();
        assert_eq!(config.base_url, SANDBOX_BASE_URL);
    }

    #[test]
    fn test_client_creation() {
        let client = OneMoneyClient::new(ClientConfig::new(creds())).unwrap();
        assert_eq!(client.transport().base_url().as_str(), "https://api.1money.com/");
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig::new(creds()).with_base_url("::nope::");
        assert!(matches!(OneMoneyClient::new(config), Err(RestError::Config(_))));
    }
}
