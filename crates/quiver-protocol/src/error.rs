//! Structured GraphQL errors and payload decoding errors.

use serde::{Deserialize, Serialize};

/// Extensions attached to every [`GraphQLError`] — currently just the HTTP
/// status the error should be served with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    pub status: u16,
}

/// A GraphQL error as it appears in the response `errors` array.
///
/// Always carries an explicit status code under `extensions.status` so the
/// caller never has to infer severity from the message text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    pub extensions: ErrorExtensions,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            extensions: ErrorExtensions { status },
        }
    }

    /// A 400-class error — the request itself is at fault.
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(message, 400)
    }

    /// A 500-class error — execution failed on our side.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(message, 500)
    }

    pub fn status(&self) -> u16 {
        self.extensions.status
    }
}

impl std::fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GraphQL error [{}]: {}", self.extensions.status, self.message)
    }
}

impl std::error::Error for GraphQLError {}

/// Failure to decode an inbound request body into a [`GraphQLPayload`].
///
/// These are always client errors: the body claimed a content type it did
/// not honor.
///
/// [`GraphQLPayload`]: crate::GraphQLPayload
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("POST body sent invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("POST body sent an undecodable form: {0}")]
    InvalidForm(#[from] serde_urlencoded::de::Error),

    #[error("variables are invalid JSON: {0}")]
    InvalidVariables(serde_json::Error),

    #[error("request body is not valid UTF-8")]
    InvalidUtf8,
}
