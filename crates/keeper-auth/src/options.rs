//! Per-client OAuth settings

use common::Secret;

/// OAuth client registration used for every grant a client performs.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Request `offline_access` and keep the first refresh token for good.
    pub offline: bool,
}

impl ClientOptions {
    /// Options with the default offline grant.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret<String>>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            offline: true,
        }
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Scope matching the grant mode.
    pub fn scope(&self) -> &'static str {
        if self.offline {
            crate::OFFLINE_SCOPE
        } else {
            crate::ONLINE_SCOPE
        }
    }

    /// Check both identifiers are present. Returns the offending field name.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.client_id.trim().is_empty() {
            return Err("client_id");
        }
        if self.client_secret.is_blank() {
            return Err("client_secret");
        }
        Ok(())
    }
}
