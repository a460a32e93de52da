//! Document API: `{endpoint}/v2/document[/{id}]`

use serde_json::Value;
use transport::Method;

use super::ApiResource;
use crate::client::KeeperClient;
use crate::error::Result;
use crate::request::ApiRequest;

pub struct DocumentApi<'a> {
    client: &'a KeeperClient,
    base: String,
}

impl<'a> DocumentApi<'a> {
    pub fn new(client: &'a KeeperClient) -> Self {
        Self {
            base: ApiResource::Document.url(client.endpoint()),
            client,
        }
    }

    /// Create a document.
    pub async fn post(&self, document: &Value) -> Result<Value> {
        self.client
            .request(ApiRequest::new(Method::POST, self.base.as_str()).with_body(document.clone()))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client
            .request(ApiRequest::get(self.item_url(id)))
            .await
    }

    /// Apply `update` to document `id`.
    pub async fn update(&self, id: &str, update: &Value) -> Result<Value> {
        self.client
            .request(ApiRequest::new(Method::PUT, self.item_url(id)).with_body(update.clone()))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<Value> {
        self.client
            .request(ApiRequest::new(Method::DELETE, self.item_url(id)))
            .await
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{id}", self.base)
    }
}
