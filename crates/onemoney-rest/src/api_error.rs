//! Structured API errors with status-based classification
//!
//! Every non-2xx response is turned into an [`ApiError`]. The 1Money API also
//! sometimes answers a rate limit with HTTP 200 and an error-shaped body; that
//! case is detected and reported as a 429.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::header::RETRY_AFTER;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;

/// Response header carrying the server-side request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Error code the API uses for rate limiting
pub const RATE_LIMIT_CODE: &str = "Too_Many_Requests";

/// Status codes retried when no explicit set is configured
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 4] = [429, 502, 503, 504];

/// Error categories derived from the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 401
    Authentication,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 422
    UnprocessableEntity,
    /// 429
    RateLimited,
    /// Any 5xx
    Server,
    /// Any other 4xx (or an unexpected non-2xx status)
    Client,
}

impl ApiErrorKind {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            422 => Self::UnprocessableEntity,
            429 => Self::RateLimited,
            500..=599 => Self::Server,
            _ => Self::Client,
        }
    }
}

/// Fixed message used when the error body carries no `detail`
pub fn fallback_message(status: u16) -> &'static str {
    match status {
        400 => "bad request, check request parameters",
        401 => "authentication failed, verify credentials",
        403 => "access forbidden, check permissions",
        404 => "resource not found",
        409 => "conflict with current resource state",
        422 => "request validation failed",
        429 => "too many requests, reduce rate",
        500 => "internal server error, try again later",
        502 => "bad gateway, try again later",
        503 => "service unavailable, try again later",
        504 => "gateway timeout, try again later",
        _ => "unexpected error response",
    }
}

/// Error body shape returned by the API (every field optional)
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    instance: Option<String>,
}

impl ErrorBody {
    fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// `status` may arrive as a number or a numeric string
    fn status(&self) -> Option<u16> {
        match self.status.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn is_rate_limit(&self) -> bool {
        self.code.as_deref() == Some(RATE_LIMIT_CODE) || self.status() == Some(429)
    }
}

/// An error response from the 1Money API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status_code} {status_text}: {message}")]
pub struct ApiError {
    /// HTTP status (429 for an embedded rate limit)
    pub status_code: u16,
    /// Canonical reason phrase for the status
    pub status_text: String,
    /// Human-readable message: `detail` or the fallback for the status
    pub message: String,
    /// Machine-readable error code from the body
    pub code: Option<String>,
    /// `detail` from the body
    pub detail: Option<String>,
    /// `instance` from the body
    pub instance: Option<String>,
    /// `X-Request-Id` response header
    pub request_id: Option<String>,
    /// Response body as received
    pub raw_body: String,
    /// Server-requested wait before retrying
    pub retry_after: Option<Duration>,
}

impl ApiError {
    /// Build an error from a non-2xx response
    pub fn from_response(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Self {
        let parsed = ErrorBody::parse(body).unwrap_or_default();
        Self::build(status, headers, body, parsed)
    }

    /// Detect a rate limit hidden inside a 2xx response
    ///
    /// Returns `None` for ordinary success bodies.
    pub fn from_embedded_rate_limit(headers: &HeaderMap, body: &[u8]) -> Option<Self> {
        let parsed = ErrorBody::parse(body)?;
        if !parsed.is_rate_limit() {
            return None;
        }
        Some(Self::build(StatusCode::TOO_MANY_REQUESTS, headers, body, parsed))
    }

    fn build(status: StatusCode, headers: &HeaderMap, body: &[u8], parsed: ErrorBody) -> Self {
        let status_code = status.as_u16();
        let detail = parsed.detail.filter(|d| !d.is_empty());
        let message = detail
            .clone()
            .unwrap_or_else(|| fallback_message(status_code).to_string());
        let retry_after = parse_retry_after(headers, detail.as_deref(), Utc::now());
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            status_code,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            message,
            code: parsed.code,
            detail,
            instance: parsed.instance,
            request_id,
            raw_body: String::from_utf8_lossy(body).into_owned(),
            retry_after,
        }
    }

    /// Error category
    pub fn kind(&self) -> ApiErrorKind {
        ApiErrorKind::from_status(self.status_code)
    }

    /// Check if the default policy retries this status
    pub fn is_retryable(&self) -> bool {
        DEFAULT_RETRYABLE_STATUS_CODES.contains(&self.status_code)
    }

    /// Check if credentials were rejected
    pub fn is_auth_error(&self) -> bool {
        self.kind() == ApiErrorKind::Authentication
    }

    /// Check if access was denied
    pub fn is_forbidden(&self) -> bool {
        self.kind() == ApiErrorKind::Forbidden
    }

    /// Check if the resource does not exist
    pub fn is_not_found(&self) -> bool {
        self.kind() == ApiErrorKind::NotFound
    }

    /// Check if the request failed validation
    pub fn is_validation_error(&self) -> bool {
        self.kind() == ApiErrorKind::UnprocessableEntity
    }

    /// Check if this is a rate limit
    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ApiErrorKind::RateLimited
    }

    /// Check if this is a 5xx
    pub fn is_server_error(&self) -> bool {
        self.kind() == ApiErrorKind::Server
    }

    /// Check if this is a 4xx
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }
}

/// Extract a server-requested retry delay
///
/// Checked in order: `Retry-After` as delta-seconds, `Retry-After` as an HTTP
/// date, then a `Retry after <duration>` phrase in the error detail.
pub fn parse_retry_after(
    headers: &HeaderMap,
    detail: Option<&str>,
    now: DateTime<Utc>,
) -> Option<Duration> {
    if let Some(value) = headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok()) {
        let value = value.trim();
        if let Ok(secs) = value.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
        if let Ok(at) = DateTime::parse_from_rfc2822(value) {
            let wait = at.with_timezone(&Utc) - now;
            return Some(wait.to_std().unwrap_or(Duration::ZERO));
        }
    }

    detail.and_then(retry_after_from_detail)
}

fn retry_after_from_detail(detail: &str) -> Option<Duration> {
    const PHRASE: &str = "retry after";

    let lower = detail.to_ascii_lowercase();
    let start = lower.find(PHRASE)? + PHRASE.len();
    let token = detail[start..].split_whitespace().next()?;
    parse_duration(token.trim_end_matches(|c: char| !c.is_ascii_alphanumeric()))
}

/// Parse durations such as `4s`, `500ms`, `1m30s` or `1.5h`
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return None;
    }

    let mut total_ms = 0.0_f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let (millis, unit_len) = if rest.starts_with("ms") {
            (1.0, 2)
        } else if rest.starts_with('s') {
            (1_000.0, 1)
        } else if rest.starts_with('m') {
            (60_000.0, 1)
        } else if rest.starts_with('h') {
            (3_600_000.0, 1)
        } else {
            return None;
        };
        rest = &rest[unit_len..];
        total_ms += value * millis;
    }

    Duration::try_from_secs_f64(total_ms / 1_000.0).ok()
}
