//! Request and response types exchanged with the transport

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RestError, RestResult};

/// Header used to let the server deduplicate retried writes
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// One logical API operation
///
/// The same request (same body bytes) is re-signed and resent on every retry.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL, without query string
    pub path: String,
    /// Raw body (empty for bodiless requests)
    pub body: Bytes,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// Query parameters
    pub query: BTreeMap<String, String>,
}

impl Request {
    /// Create a request with an empty body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Bytes::new(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Set a raw body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize a value as the JSON body
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> RestResult<Self> {
        let body = serde_json::to_vec(value).map_err(|e| RestError::Parse(e.to_string()))?;
        Ok(self.with_body(body))
    }

    /// Add a request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Attach an idempotency key so retried writes are not applied twice
    pub fn with_idempotency_key(self, key: impl Into<String>) -> Self {
        self.with_header(IDEMPOTENCY_KEY_HEADER, key)
    }

    /// Check if the request carries a body
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

/// A successful (2xx) response
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status_code: u16,
    /// Canonical reason phrase
    pub status_text: String,
    /// Response body
    pub body: Bytes,
    /// Response headers
    pub headers: HeaderMap,
}

impl Response {
    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> RestResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| RestError::Parse(e.to_string()))
    }

    /// Body as UTF-8 text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
