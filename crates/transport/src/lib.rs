//! HTTP transport abstraction for the Keeper SDK
//!
//! Defines the `Transport` trait that decouples the credential lifecycle and
//! request engine from the HTTP client library. `ReqwestTransport` is the
//! production implementation; `ScriptedTransport` (feature `test-util`)
//! replays canned responses and records what was sent.
//!
//! Bodies are always surfaced as `serde_json::Value`: JSON responses are
//! parsed, empty bodies become `Null`, anything else is kept as a string.

#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod reqwest_transport;

#[cfg(any(test, feature = "test-util"))]
pub use mock::ScriptedTransport;
pub use reqwest::Method;
pub use reqwest_transport::ReqwestTransport;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` fields, in order.
    Form(Vec<(String, String)>),
}

/// A single HTTP request as seen by the transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer: Option<String>,
    /// Ask for JSON and parse the response body as JSON.
    pub accept_json: bool,
    pub body: Body,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            accept_json: true,
            body: Body::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Form-encoded POST, as used against OAuth token endpoints.
    pub fn post_form<K, V>(url: impl Into<String>, fields: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
            .collect();
        Self {
            body: Body::Form(fields),
            ..Self::new(Method::POST, url)
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    /// Value of a form field, if this is a form request carrying it.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        match &self.body {
            Body::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Status code and decoded body of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// The structured `error` member of a JSON object body, if any.
    pub fn error_payload(&self) -> Option<&Value> {
        self.body.as_object().and_then(|o| o.get("error"))
    }
}

/// Transport-level failures: the request never produced a response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("reading response body failed: {0}")]
    Body(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Executes HTTP requests.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
/// A non-2xx status is a successful exchange, not an error: callers decide what
/// status codes mean.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>>;
}

/// Decode a response body. Empty is `Null`; unparseable or non-JSON text is a string.
pub fn decode_body(text: &str, accept_json: bool) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    if accept_json {
        if let Ok(value) = serde_json::from_str(text) {
            return value;
        }
    }
    Value::String(text.to_owned())
}
