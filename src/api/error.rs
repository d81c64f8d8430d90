//! Error type shared by the request gateway and every service wrapper.

use thiserror::Error;

use super::client::ResponseBody;
use super::tokens::TokenStoreError;

/// Failure of a call against the Drivium backend (or a presigned storage URL).
///
/// Network-level failures report status 0. HTTP-level failures carry the exact
/// status, the request URL, and whatever body the server sent back.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("Network error: {detail}")]
    Network { url: String, detail: String },

    /// The server answered with a status outside 200-299.
    #[error("{message}")]
    Http {
        status: u16,
        url: String,
        message: String,
        body: Option<ResponseBody>,
    },

    /// The response was successful but did not match the expected shape.
    #[error("Failed to decode response from {url}: {detail}")]
    Decode {
        status: u16,
        url: String,
        detail: String,
    },

    /// The request could not be built (bad method, unserializable payload).
    #[error("Invalid request to {url}: {detail}")]
    InvalidRequest { url: String, detail: String },

    /// The access token could not be persisted after login.
    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}

impl ApiError {
    pub(crate) fn network(url: &str, err: &reqwest::Error) -> Self {
        ApiError::Network {
            url: url.to_string(),
            detail: err.to_string(),
        }
    }

    /// HTTP status code, or 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Http { status, .. } | ApiError::Decode { status, .. } => *status,
            _ => 0,
        }
    }

    /// URL of the failed request, if one was attempted.
    pub fn url(&self) -> Option<&str> {
        match self {
            ApiError::Network { url, .. }
            | ApiError::Http { url, .. }
            | ApiError::Decode { url, .. }
            | ApiError::InvalidRequest { url, .. } => Some(url),
            ApiError::TokenStore(_) => None,
        }
    }

    /// Data attached to the failure: the parsed response body for HTTP
    /// failures, the underlying error text for network failures.
    pub fn data(&self) -> Option<ResponseBody> {
        match self {
            ApiError::Http { body, .. } => body.clone(),
            ApiError::Network { detail, .. } => Some(ResponseBody::Text(detail.clone())),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == 401
    }
}
