//! Profile API: `{endpoint}/v2/profile`

use serde_json::Value;

use super::ApiResource;
use crate::client::KeeperClient;
use crate::error::Result;
use crate::request::ApiRequest;

pub struct ProfileApi<'a> {
    client: &'a KeeperClient,
}

impl<'a> ProfileApi<'a> {
    pub fn new(client: &'a KeeperClient) -> Self {
        Self { client }
    }

    /// Current user's profile.
    pub async fn get(&self) -> Result<Value> {
        self.client
            .request(ApiRequest::get(ApiResource::Profile.url(self.client.endpoint())))
            .await
    }
}
