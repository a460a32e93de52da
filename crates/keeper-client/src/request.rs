//! Authenticated request description

use serde_json::Value;
use transport::{HttpRequest, Method};

/// What a resource call wants sent; the engine adds the bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    /// Ask for and parse JSON. On unless explicitly turned off.
    pub json: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            json: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Accept a non-JSON response; the body comes back as a JSON string.
    pub fn raw(mut self) -> Self {
        self.json = false;
        self
    }

    pub(crate) fn to_http(&self, bearer: &str) -> HttpRequest {
        let mut request = HttpRequest::new(self.method.clone(), self.url.as_str()).with_bearer(bearer);
        request.accept_json = self.json;
        if let Some(body) = &self.body {
            request = request.with_json(body.clone());
        }
        request
    }
}

impl From<&str> for ApiRequest {
    fn from(url: &str) -> Self {
        Self::get(url)
    }
}

impl From<String> for ApiRequest {
    fn from(url: String) -> Self {
        Self::get(url)
    }
}
