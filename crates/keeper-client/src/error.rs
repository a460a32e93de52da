//! Error types for discovery, token lifecycle and authenticated requests

use serde_json::Value;

/// Every failure an SDK call can surface. None are swallowed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error("bad API info: {0}")]
    BadApiInfo(String),

    #[error("bad realm: {0}")]
    BadRealm(String),

    #[error("transport error: {0}")]
    Transport(#[from] transport::TransportError),

    #[error("authorization server error: {0}")]
    AuthServer(Value),

    #[error("malformed token response: {0}")]
    MalformedTokenResponse(String),

    #[error("API error: {0}")]
    Api(Value),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: Value },

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("too many refresh attempts")]
    TooManyRefreshAttempts,
}

impl From<keeper_auth::Error> for Error {
    fn from(err: keeper_auth::Error) -> Self {
        match err {
            keeper_auth::Error::Transport(e) => Error::Transport(e),
            keeper_auth::Error::AuthServer(payload) => Error::AuthServer(payload),
            keeper_auth::Error::MalformedTokenResponse(msg) => Error::MalformedTokenResponse(msg),
        }
    }
}

impl Error {
    /// Failures that need the user to authorize again: the session cannot be recovered.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            Error::NoRefreshToken | Error::TooManyRefreshAttempts | Error::AuthServer(_)
        )
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::BadApiInfo(_) => "bad_api_info",
            Error::BadRealm(_) => "bad_realm",
            Error::Transport(_) => "transport",
            Error::AuthServer(_) => "auth_server",
            Error::MalformedTokenResponse(_) => "malformed_token_response",
            Error::Api(_) => "api",
            Error::HttpStatus { .. } => "http_status",
            Error::NoRefreshToken => "no_refresh_token",
            Error::TooManyRefreshAttempts => "too_many_refresh_attempts",
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
