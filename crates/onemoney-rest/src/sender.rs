//! HTTP sender abstraction
//!
//! The transport never talks to `reqwest` directly. It hands a fully built
//! `http::Request` to an [`HttpSend`] implementation, which lets tests inject
//! scripted responses without opening sockets.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::NetworkError;

/// Sends one HTTP request and collects the full response body
///
/// An `Err` means no HTTP response was received. Any status code, including
/// 4xx and 5xx, is an `Ok`.
#[async_trait]
pub trait HttpSend: Send + Sync + 'static {
    /// Execute the request
    async fn http_send(&self, req: http::Request<Bytes>)
        -> Result<http::Response<Bytes>, NetworkError>;
}

/// [`HttpSend`] backed by a pooled `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new sender with a reqwest::Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    #[instrument(skip_all, fields(method = %req.method(), uri = %req.uri()))]
    async fn http_send(
        &self,
        req: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, NetworkError> {
        let req = reqwest::Request::try_from(req)?;
        let resp = self.client.execute(req).await?;

        let status = resp.status();
        let version = resp.version();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.version_mut() = version;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
