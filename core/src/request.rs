//! Per-call request configuration.
//!
//! Every field is optional; `ApiClient::build_request` resolves the defaults:
//!
//! - `method`: `POST` when `body` is set, otherwise `GET`.
//! - `headers`: applied over `content-type: application/json` and, when
//!   `token` is set, `authorization: Bearer <token>`. Names compare
//!   case-insensitively and the caller's value wins.
//! - `transport`: overrides handed to whoever executes the request.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Transport-level overrides for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub body: Option<Value>,
    pub token: Option<String>,
    pub method: Option<HttpMethod>,
    pub headers: Vec<(String, String)>,
    pub transport: TransportOptions,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `payload` into the request body.
    pub fn with_json<T: Serialize>(self, payload: &T) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.with_body(value))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = Some(timeout);
        self
    }

    /// The method this config will be sent with.
    pub fn resolved_method(&self) -> HttpMethod {
        self.method.unwrap_or(if self.body.is_some() {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        })
    }
}
