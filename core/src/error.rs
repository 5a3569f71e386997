//! Error types for the remote API client.
//!
//! # Design
//! A 401 is not an error at all (see `ApiClient::parse_response`), so every
//! variant here is a hard failure. `Status` displays as the raw response
//! text so page handlers can show the backend's own message.

/// Errors produced while building a request, executing it, or parsing the
/// response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned a status outside 2xx other than 401.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("{0}")]
    Transport(String),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A successful response body was not valid JSON, or not the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
