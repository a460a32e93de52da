//! Resource API built on the authenticated request engine
//!
//! Every resource is a thin parameterization of `KeeperClient::request`.
//! `ApiResource` is the static registry of what the client exposes and where
//! each resource lives under the API root.

pub mod document;
pub mod profile;

pub use document::DocumentApi;
pub use profile::ProfileApi;

use crate::client::KeeperClient;

/// Resources served by the Keeper API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiResource {
    Document,
    Profile,
}

impl ApiResource {
    pub const ALL: [ApiResource; 2] = [ApiResource::Document, ApiResource::Profile];

    pub fn name(self) -> &'static str {
        match self {
            ApiResource::Document => "document",
            ApiResource::Profile => "profile",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Path below the API root.
    pub fn path(self) -> &'static str {
        match self {
            ApiResource::Document => "/v2/document",
            ApiResource::Profile => "/v2/profile",
        }
    }

    /// Absolute URL for this resource under `endpoint`.
    pub fn url(self, endpoint: &str) -> String {
        format!("{}{}", endpoint.trim_end_matches('/'), self.path())
    }
}

impl KeeperClient {
    /// Document CRUD.
    pub fn documents(&self) -> DocumentApi<'_> {
        DocumentApi::new(self)
    }

    /// The authenticated user's profile.
    pub fn profile(&self) -> ProfileApi<'_> {
        ProfileApi::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_round_trips_names() {
        for resource in ApiResource::ALL {
            assert_eq!(ApiResource::from_name(resource.name()), Some(resource));
        }
        assert_eq!(ApiResource::from_name("label"), None);
    }

    #[test]
    fn urls_hang_off_endpoint() {
        assert_eq!(
            ApiResource::Document.url("https://api.nunux.org/keeper/"),
            "https://api.nunux.org/keeper/v2/document"
        );
        assert_eq!(
            ApiResource::Profile.url("https://api.nunux.org/keeper"),
            "https://api.nunux.org/keeper/v2/profile"
        );
    }
}
