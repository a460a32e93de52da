//! Error types for token endpoint operations

/// Errors from authorization-code exchange and token refresh.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] transport::TransportError),

    #[error("authorization server rejected the request: {0}")]
    AuthServer(serde_json::Value),

    #[error("malformed token response: {0}")]
    MalformedTokenResponse(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
