//! Authorization realm descriptor
//!
//! The realm's `token-service` URL is the base from which both OAuth
//! endpoints are derived: `{base}/auth` and `{base}/token`.

use url::Url;

/// Resolved authentication realm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealmDescriptor {
    /// Realm name, when the realm document carries one.
    pub name: Option<String>,
    /// Base URL of the OpenID Connect token service.
    pub token_service: Url,
}

impl RealmDescriptor {
    pub fn new(token_service: &str, name: Option<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            name,
            token_service: Url::parse(token_service)?,
        })
    }

    /// `{token-service}/auth`
    pub fn authorize_endpoint(&self) -> Url {
        self.service_endpoint("auth")
    }

    /// `{token-service}/token`
    pub fn token_endpoint(&self) -> Url {
        self.service_endpoint("token")
    }

    fn service_endpoint(&self, leaf: &str) -> Url {
        let mut url = self.token_service.clone();
        let path = format!("{}/{leaf}", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}
