//! SDK entry point
//!
//! One `KeeperSdk` per API endpoint. It owns the discovery cache, so every
//! client it creates shares one realm lookup.

use std::sync::Arc;

use keeper_auth::{ClientOptions, Credentials, DEFAULT_ENDPOINT, RealmDescriptor};
use tracing::debug;
use transport::{ReqwestTransport, Transport};

use crate::client::KeeperClient;
use crate::discovery::{ApiInfo, RealmDiscovery};
use crate::error::Result;

/// SDK-wide settings.
#[derive(Debug, Clone)]
pub struct SdkOptions {
    /// Keeper API root
    pub endpoint: String,
}

impl Default for SdkOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
        }
    }
}

pub struct KeeperSdk {
    transport: Arc<dyn Transport>,
    discovery: RealmDiscovery,
}

impl KeeperSdk {
    /// SDK over the default `reqwest` transport.
    pub fn new(options: SdkOptions) -> Self {
        Self::with_transport(options, Arc::new(ReqwestTransport::default()))
    }

    pub fn with_transport(options: SdkOptions, transport: Arc<dyn Transport>) -> Self {
        let endpoint = options.endpoint.trim_end_matches('/').to_owned();
        Self {
            discovery: RealmDiscovery::new(endpoint, transport.clone()),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.discovery.endpoint()
    }

    pub async fn api_info(&self) -> Result<&ApiInfo> {
        self.discovery.api_info().await
    }

    pub async fn auth_realm(&self) -> Result<Arc<RealmDescriptor>> {
        self.discovery.discover().await
    }

    /// Resolve the realm (once per SDK) and build a client for it.
    pub async fn create_client(
        &self,
        options: ClientOptions,
        credentials: Option<Credentials>,
    ) -> Result<KeeperClient> {
        let realm = self.auth_realm().await?;
        debug!(client_id = %options.client_id, offline = options.offline, "creating client");
        KeeperClient::new(
            self.endpoint(),
            self.transport.clone(),
            realm,
            options,
            credentials,
        )
    }
}
