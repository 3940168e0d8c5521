use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::client::ApiClient;
use crate::entities::Brand;
use crate::errors::StoreError;
use crate::services::CollectionClient;
use crate::store::EntityApi;

const BRANDS_PATH: &str = "/brands";

/// REST calls for watch brands.
#[derive(Clone)]
pub struct BrandService {
    crud: CollectionClient,
}

impl BrandService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            crud: CollectionClient::new(api, BRANDS_PATH),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.crud.list_raw().await
    }

    #[instrument(skip(self, payload))]
    pub async fn create_brand(&self, payload: &Value) -> Result<Brand, StoreError> {
        self.crud.create_entity(payload).await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_brand(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.crud.update_entity(id, payload).await
    }

    #[instrument(skip(self))]
    pub async fn delete_brand(&self, id: &str) -> Result<(), StoreError> {
        self.crud.delete_entity(id).await
    }
}

#[async_trait]
impl EntityApi<Brand> for BrandService {
    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        self.get_all().await
    }

    async fn create(&self, payload: &Value) -> Result<Brand, StoreError> {
        self.create_brand(payload).await
    }

    async fn update(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.update_brand(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_brand(id).await
    }
}
