//! Realm discovery
//!
//! Two chained lookups resolve the API root into a `RealmDescriptor`:
//! 1. GET `{endpoint}` → `{ "_links": { "auth-realm": { "href": .. } } }`
//! 2. GET `{href}` → `{ "token-service": <base url> }`
//!
//! Each result is cached in a `OnceCell` owned by the discovery instance, so
//! concurrent first callers share a single in-flight lookup and later calls
//! never touch the network. A failed lookup caches nothing. There is no TTL:
//! discovery documents are assumed stable for the life of the process.

use std::sync::Arc;

use keeper_auth::RealmDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};
use transport::{HttpRequest, Transport};

use crate::error::{Error, Result};

const AUTH_REALM_REL: &str = "auth-realm";

/// Self-description served at the API root.
///
/// Only the `auth-realm` link is required. Everything else is kept as the
/// server sent it, whatever its JSON type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, rename = "apiVersion", skip_serializing_if = "Option::is_none")]
    pub api_version: Option<Value>,
    /// Raw HAL `_links` object
    #[serde(default, rename = "_links")]
    pub links: Value,
}

impl ApiInfo {
    /// URL of the authentication realm document.
    pub fn auth_realm_url(&self) -> Option<&str> {
        self.links
            .get(AUTH_REALM_REL)
            .and_then(|link| link.get("href"))
            .and_then(Value::as_str)
    }
}

/// Cached discovery bound to one API endpoint.
pub struct RealmDiscovery {
    endpoint: String,
    transport: Arc<dyn Transport>,
    api_info: OnceCell<ApiInfo>,
    realm: OnceCell<Arc<RealmDescriptor>>,
}

impl RealmDiscovery {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            api_info: OnceCell::new(),
            realm: OnceCell::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// API root document. Fails with `BadApiInfo` on any problem, including transport errors.
    pub async fn api_info(&self) -> Result<&ApiInfo> {
        self.api_info
            .get_or_try_init(|| self.fetch_api_info())
            .await
    }

    /// Resolve the authentication realm, fetching the API info first if needed.
    pub async fn discover(&self) -> Result<Arc<RealmDescriptor>> {
        self.realm
            .get_or_try_init(|| async {
                let info = self.api_info().await?;
                let realm_url = info
                    .auth_realm_url()
                    .ok_or_else(|| Error::BadApiInfo(format!("missing `{AUTH_REALM_REL}` link")))?
                    .to_owned();
                self.fetch_realm(&realm_url).await.map(Arc::new)
            })
            .await
            .cloned()
    }

    /// Whether the realm is already resolved (no network on the next `discover`).
    pub fn is_resolved(&self) -> bool {
        self.realm.initialized()
    }

    async fn fetch_api_info(&self) -> Result<ApiInfo> {
        debug!(endpoint = %self.endpoint, "fetching API info");
        let response = self
            .transport
            .send(HttpRequest::get(self.endpoint.as_str()))
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "unable to get API info (transport)");
                Error::BadApiInfo(e.to_string())
            })?;

        if let Some(payload) = response.error_payload() {
            error!(endpoint = %self.endpoint, error = %payload, "unable to get API info");
            return Err(Error::BadApiInfo(payload.to_string()));
        }

        let info: ApiInfo = serde_json::from_value(response.body)
            .map_err(|e| Error::BadApiInfo(format!("unexpected API info document: {e}")))?;
        if info.auth_realm_url().is_none() {
            return Err(Error::BadApiInfo(format!("missing `{AUTH_REALM_REL}` link")));
        }
        info!(
            endpoint = %self.endpoint,
            name = ?info.name,
            api_version = ?info.api_version,
            "API info loaded"
        );
        Ok(info)
    }

    async fn fetch_realm(&self, realm_url: &str) -> Result<RealmDescriptor> {
        debug!(realm_url, "fetching realm info");
        let response = self
            .transport
            .send(HttpRequest::get(realm_url))
            .await
            .inspect_err(|e| error!(realm_url, error = %e, "unable to get realm info (transport)"))?;

        if let Some(payload) = response.error_payload() {
            error!(realm_url, error = %payload, "unable to get realm info");
            return Err(Error::BadRealm(payload.to_string()));
        }

        let token_service = response
            .body
            .get("token-service")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::BadRealm("missing `token-service`".into()))?;
        let name = response
            .body
            .get("realm")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let realm = RealmDescriptor::new(token_service, name)
            .map_err(|e| Error::BadRealm(format!("invalid token-service URL {token_service:?}: {e}")))?;
        info!(token_service = %realm.token_service, "realm resolved");
        Ok(realm)
    }
}
