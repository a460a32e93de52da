//! `reqwest`-backed transport

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use tracing::debug;

use crate::{Body, HttpRequest, HttpResponse, Result, Transport, TransportError, decode_body};

/// Production transport over a shared `reqwest::Client`.
///
/// No timeout is applied unless one is configured on the underlying client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a transport whose client enforces a whole-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if request.accept_json {
            builder = builder.header(ACCEPT, HeaderValue::from_static("application/json"));
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Form(fields) => builder.form(fields),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(format!("{} {}: {e}", request.method, request.url)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        debug!(method = %request.method, url = %request.url, status, "http exchange complete");

        Ok(HttpResponse {
            status,
            body: decode_body(&text, request.accept_json),
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>> {
        Box::pin(self.execute(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn sends_bearer_and_parses_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/profile")
            .match_header("authorization", "Bearer at_123")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uid":"john"}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::default();
        let response = transport
            .send(HttpRequest::get(format!("{}/v2/profile", server.url())).with_bearer("at_123"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"uid": "john"}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn posts_form_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "rt_1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"a.b.c"}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::default();
        let response = transport
            .send(HttpRequest::post_form(
                format!("{}/token", server.url()),
                &[("grant_type", "refresh_token"), ("refresh_token", "rt_1")],
            ))
            .await
            .unwrap();

        assert_eq!(response.body["access_token"], "a.b.c");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_not_a_transport_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/v2/document/42")
            .with_status(404)
            .with_body("")
            .create_async()
            .await;

        let transport = ReqwestTransport::default();
        let response = transport
            .send(HttpRequest::new(
                reqwest::Method::DELETE,
                format!("{}/v2/document/42", server.url()),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        let transport = ReqwestTransport::default();
        // Port 1 on loopback is never listening in test environments.
        let result = transport.send(HttpRequest::get("http://127.0.0.1:1/")).await;
        assert!(
            matches!(result, Err(TransportError::Connection(_))),
            "got {result:?}"
        );
    }
}
