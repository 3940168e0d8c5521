use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::client::ApiClient;
use crate::entities::Category;
use crate::errors::StoreError;
use crate::services::CollectionClient;
use crate::store::EntityApi;

const CATEGORIES_PATH: &str = "/categories";

/// REST calls for product categories.
#[derive(Clone)]
pub struct CategoryService {
    crud: CollectionClient,
}

impl CategoryService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            crud: CollectionClient::new(api, CATEGORIES_PATH),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.crud.list_raw().await
    }

    #[instrument(skip(self, payload))]
    pub async fn create_category(&self, payload: &Value) -> Result<Category, StoreError> {
        self.crud.create_entity(payload).await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_category(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.crud.update_entity(id, payload).await
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: &str) -> Result<(), StoreError> {
        self.crud.delete_entity(id).await
    }
}

#[async_trait]
impl EntityApi<Category> for CategoryService {
    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        self.get_all().await
    }

    async fn create(&self, payload: &Value) -> Result<Category, StoreError> {
        self.create_category(payload).await
    }

    async fn update(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.update_category(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_category(id).await
    }
}
