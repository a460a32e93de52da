//! OAuth token exchange and refresh
//!
//! Handles the two token endpoint interactions:
//! 1. Authorization code exchange (initial OAuth flow completion)
//! 2. Token refresh (proactive, reactive and scheduled refresh)
//!
//! Both operations POST form data to the realm's `{token-service}/token`
//! with different grant types and client credentials in the body.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use transport::{HttpRequest, Transport};

use crate::error::{Error, Result};
use crate::options::ClientOptions;
use crate::realm::RealmDescriptor;

/// Response from the token endpoint for both exchange and refresh.
///
/// `expires_in` is a delta in seconds from the response time. The caller
/// converts this to an absolute unix millisecond timestamp.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    String::from("bearer")
}

/// Exchange an authorization code for tokens (initial OAuth flow).
pub async fn exchange_code(
    transport: &dyn Transport,
    realm: &RealmDescriptor,
    options: &ClientOptions,
    redirect_uri: &str,
    code: &str,
) -> Result<TokenResponse> {
    debug!(client_id = %options.client_id, "exchanging authorization code");
    let request = HttpRequest::post_form(
        realm.token_endpoint().as_str(),
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", options.client_id.as_str()),
            ("client_secret", options.client_secret.expose().as_str()),
            ("redirect_uri", redirect_uri),
        ],
    );
    post_token_request(transport, request, "token exchange").await
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_token(
    transport: &dyn Transport,
    realm: &RealmDescriptor,
    options: &ClientOptions,
    refresh: &str,
) -> Result<TokenResponse> {
    debug!(
        mode = if options.offline { "offline" } else { "online" },
        "refreshing access token"
    );
    let request = HttpRequest::post_form(
        realm.token_endpoint().as_str(),
        &[
            ("grant_type", "refresh_token"),
            ("client_id", options.client_id.as_str()),
            ("client_secret", options.client_secret.expose().as_str()),
            ("refresh_token", refresh),
        ],
    );
    post_token_request(transport, request, "token refresh").await
}

async fn post_token_request(
    transport: &dyn Transport,
    request: HttpRequest,
    operation: &'static str,
) -> Result<TokenResponse> {
    let response = transport.send(request).await.map_err(|e| {
        error!(operation, error = %e, "token endpoint unreachable");
        Error::from(e)
    })?;

    if let Some(payload) = response.error_payload() {
        error!(operation, status = response.status, error = %payload, "authorization server returned an error");
        return Err(Error::AuthServer(response.body));
    }
    if response.status >= 400 {
        error!(operation, status = response.status, "token endpoint returned an error status");
        return Err(Error::AuthServer(response.body));
    }

    parse_token_response(response.body).inspect_err(|e| {
        error!(operation, error = %e, "unusable token response");
    })
}

fn parse_token_response(body: Value) -> Result<TokenResponse> {
    let token: TokenResponse = serde_json::from_value(body)
        .map_err(|e| Error::MalformedTokenResponse(e.to_string()))?;
    if token.access_token.is_empty() {
        return Err(Error::MalformedTokenResponse("empty access_token".into()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use transport::{Method, ScriptedTransport};

    fn realm() -> RealmDescriptor {
        RealmDescriptor::new(
            "https://login.nunux.org/auth/realms/nunux.org/protocol/openid-connect",
            None,
        )
        .unwrap()
    }

    fn options() -> ClientOptions {
        ClientOptions::new("keeper-cli", "s3cret")
    }

    #[test]
    fn token_response_defaults() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"at"}"#).unwrap();
        assert_eq!(token.refresh_token, None);
        assert_eq!(token.expires_in, 0);
        assert_eq!(token.token_type, "bearer");
    }

    #[tokio::test]
    async fn exchange_posts_authorization_code_grant() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            200,
            json!({"access_token": "at", "refresh_token": "rt", "expires_in": 3600, "token_type": "bearer"}),
        );

        let token = exchange_code(&transport, &realm(), &options(), "http://cb", "code-1")
            .await
            .unwrap();
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(
            sent.url,
            "https://login.nunux.org/auth/realms/nunux.org/protocol/openid-connect/token"
        );
        assert_eq!(sent.form_field("grant_type"), Some("authorization_code"));
        assert_eq!(sent.form_field("code"), Some("code-1"));
        assert_eq!(sent.form_field("client_id"), Some("keeper-cli"));
        assert_eq!(sent.form_field("client_secret"), Some("s3cret"));
        assert_eq!(sent.form_field("redirect_uri"), Some("http://cb"));
        assert!(sent.bearer.is_none());
    }

    #[tokio::test]
    async fn refresh_posts_refresh_token_grant() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({"access_token": "at2", "expires_in": 60}));

        let token = refresh_token(&transport, &realm(), &options(), "rt_1")
            .await
            .unwrap();
        assert_eq!(token.access_token, "at2");

        let sent = &transport.requests()[0];
        assert_eq!(sent.form_field("grant_type"), Some("refresh_token"));
        assert_eq!(sent.form_field("refresh_token"), Some("rt_1"));
        assert_eq!(sent.form_field("client_secret"), Some("s3cret"));
        assert_eq!(sent.form_field("code"), None);
    }

    #[tokio::test]
    async fn error_payload_is_auth_server_error() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            400,
            json!({"error": "invalid_grant", "error_description": "Code not valid"}),
        );

        let err = exchange_code(&transport, &realm(), &options(), "http://cb", "bad")
            .await
            .unwrap_err();
        match err {
            Error::AuthServer(payload) => assert_eq!(payload["error"], "invalid_grant"),
            other => panic!("expected AuthServer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_payload_with_success_status_still_fails() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({"error": "unauthorized_client"}));

        let result = refresh_token(&transport, &realm(), &options(), "rt").await;
        assert!(matches!(result, Err(Error::AuthServer(_))));
    }

    #[tokio::test]
    async fn bad_status_without_payload_is_auth_server_error() {
        let transport = ScriptedTransport::new();
        transport.push_json(502, json!("upstream down"));

        let result = refresh_token(&transport, &realm(), &options(), "rt").await;
        assert!(matches!(result, Err(Error::AuthServer(body)) if body == "upstream down"));
    }

    #[tokio::test]
    async fn transport_failure_is_transport_error() {
        let transport = ScriptedTransport::new();
        transport.push_error("connection refused");

        let result = exchange_code(&transport, &realm(), &options(), "http://cb", "c").await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn missing_access_token_is_malformed() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({"token_type": "bearer"}));

        let result = refresh_token(&transport, &realm(), &options(), "rt").await;
        assert!(matches!(result, Err(Error::MalformedTokenResponse(_))));
    }
}
