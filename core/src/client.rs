//! Stateless HTTP request builder and response parser for the remote API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. A call is split into `build_request`, which turns an endpoint and a
//! `RequestConfig` into an `HttpRequest`, and `parse_response`, which
//! normalizes the `HttpResponse` the caller got back. Keeping the round-trip
//! outside makes the whole outcome policy testable without a server.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::request::RequestConfig;

const CONTENT_TYPE: &str = "content-type";
const AUTHORIZATION: &str = "authorization";

/// Synchronous, stateless client for the remote todo/auth API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Join `endpoint` onto the base URL with exactly one `/` between them.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub fn build_request(
        &self,
        endpoint: &str,
        config: &RequestConfig,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = vec![(CONTENT_TYPE.to_string(), "application/json".to_string())];
        if let Some(token) = &config.token {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }
        for (name, value) in &config.headers {
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some(existing) => existing.1.clone_from(value),
                None => headers.push((name.clone(), value.clone())),
            }
        }

        let body = config
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;

        Ok(HttpRequest {
            method: config.resolved_method(),
            url: self.url(endpoint),
            headers,
            body,
            timeout: config.transport.timeout,
        })
    }

    /// Normalize a response.
    ///
    /// - 401 yields `Ok(None)`: the caller decides what "no data" means.
    /// - 2xx yields the parsed JSON body (`Value::Null` for an empty body).
    /// - Anything else is `ApiError::Status` carrying the response text.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Option<Value>, ApiError> {
        match response.status {
            401 => Ok(None),
            200..=299 => {
                if response.body.trim().is_empty() {
                    return Ok(Some(Value::Null));
                }
                serde_json::from_str(&response.body)
                    .map(Some)
                    .map_err(|e| ApiError::Deserialization(e.to_string()))
            }
            status => Err(ApiError::Status {
                status,
                message: response.body,
            }),
        }
    }

    /// `parse_response`, then deserialize the JSON into `T`.
    pub fn parse_json<T: DeserializeOwned>(
        &self,
        response: HttpResponse,
    ) -> Result<Option<T>, ApiError> {
        self.parse_response(response)?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
            })
            .transpose()
    }
}
