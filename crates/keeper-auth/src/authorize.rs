//! Authorization URL construction
//!
//! Builds the authorization-code request the user's browser is sent to. The
//! `state` parameter is an opaque value the caller generates for CSRF
//! protection; the authorization server returns it unchanged in the callback.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use url::Url;

use crate::options::ClientOptions;
use crate::realm::RealmDescriptor;

/// Generate a random OAuth `state` value (32 bytes, URL-safe base64, no padding).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `{token-service}/auth?response_type=code&client_id=..&state=..&scope=..&redirect_uri=..`
///
/// Scope is `offline_access` for offline clients and `openid` otherwise.
pub fn build_authorization_url(
    realm: &RealmDescriptor,
    options: &ClientOptions,
    redirect_uri: &str,
    state: &str,
) -> Url {
    let mut url = realm.authorize_endpoint();
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &options.client_id)
        .append_pair("state", state)
        .append_pair("scope", options.scope())
        .append_pair("redirect_uri", redirect_uri);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realm() -> RealmDescriptor {
        RealmDescriptor::new(
            "https://login.example/auth/realms/x/protocol/openid-connect",
            None,
        )
        .unwrap()
    }

    #[test]
    fn url_starts_with_token_service_and_orders_params() {
        let options = ClientOptions::new("keeper-web", "s3cret");
        let url = build_authorization_url(&realm(), &options, "http://cb", "s1").to_string();

        assert!(
            url.starts_with("https://login.example/auth/realms/x/protocol/openid-connect"),
            "got: {url}"
        );
        assert!(
            url.contains("response_type=code&client_id=keeper-web&state=s1"),
            "got: {url}"
        );
        assert!(url.contains("scope=offline_access"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Fcb"));
    }

    #[test]
    fn online_client_requests_openid_scope() {
        let options = ClientOptions::new("keeper-web", "s3cret").offline(false);
        let url = build_authorization_url(&realm(), &options, "http://cb", "s1");
        let scope = url
            .query_pairs()
            .find(|(k, _)| k == "scope")
            .map(|(_, v)| v.into_owned());
        assert_eq!(scope.as_deref(), Some("openid"));
    }

    #[test]
    fn secret_never_appears_in_url() {
        let options = ClientOptions::new("keeper-web", "s3cret");
        let url = build_authorization_url(&realm(), &options, "http://cb", "s1");
        assert!(!url.as_str().contains("s3cret"));
    }

    #[test]
    fn states_are_url_safe_and_unique() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "state must be URL-safe: {a}"
        );
    }
}
