//! Error types for the PocketBase records client.
//!
//! # Design
//! Each failure a records call can hit gets its own variant so callers branch
//! on the kind instead of on an empty body. `NotFound` and `Forbidden` are the
//! two codes PocketBase embeds in a JSON error body that the client treats as
//! failures; every other body passes through to the caller untouched.

use thiserror::Error;

/// The transport could not complete the round trip (no HTTP status).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors returned by `Collection` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The network link reported itself down; no request was sent.
    #[error("network link is down")]
    Offline,

    /// The transport failed before an HTTP response was received.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body carried `"code": 404`.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The response body carried `"code": 403`.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// The server rejected a create request.
    #[error("failed to create record (HTTP {status}): {body}")]
    CreateFailed { status: u16, body: String },

    /// The response body could not be parsed as JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A required argument was empty or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The create payload is not a JSON object.
    #[error("invalid record payload: {0}")]
    InvalidPayload(String),

    /// A typed record could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The PocketBase or HTTP status code behind this error, if there is one.
    pub fn code(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::CreateFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
