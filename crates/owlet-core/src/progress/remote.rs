//! Remote document store seam.
//!
//! The wire protocol is deliberately opaque to the rest of the crate: a
//! path-addressed get/save over JSON mappings. The HTTP implementation
//! below is what production uses; tests substitute scripted stores.

use std::time::Duration;

use serde_json::{Map, Value};
use url::Url;

use super::document::DocPath;
use super::store::StoreError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Path-addressed remote document storage.
pub trait DocumentStore: Send + Sync {
    /// Fetch the document at `path` as raw JSON.
    fn get(
        &self,
        path: &DocPath,
    ) -> impl std::future::Future<Output = Result<Value, StoreError>> + Send;

    /// Merge `fields` into the document at `path`.
    fn save(
        &self,
        path: &DocPath,
        fields: &Map<String, Value>,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// REST client for the document service.
pub struct HttpDocumentStore {
    base: Url,
    client: reqwest::Client,
}

impl HttpDocumentStore {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &DocPath) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }
}

impl DocumentStore for HttpDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Value, StoreError> {
        let resp = self
            .client
            .get(self.endpoint(path))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(StoreError::Http(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }

    async fn save(&self, path: &DocPath, fields: &Map<String, Value>) -> Result<(), StoreError> {
        let resp = self
            .client
            .patch(self.endpoint(path))
            .timeout(REQUEST_TIMEOUT)
            .json(fields)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(StoreError::Http(resp.status().as_u16()));
        }
        Ok(())
    }
}
