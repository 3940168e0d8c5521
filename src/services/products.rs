use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::client::ApiClient;
use crate::entities::Product;
use crate::errors::StoreError;
use crate::services::CollectionClient;
use crate::store::EntityApi;

const PRODUCTS_PATH: &str = "/products";

/// REST calls for the product catalog.
#[derive(Clone)]
pub struct ProductService {
    crud: CollectionClient,
}

impl ProductService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            crud: CollectionClient::new(api, PRODUCTS_PATH),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.crud.list_raw().await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Product, StoreError> {
        self.crud.fetch_entity(id).await
    }

    #[instrument(skip(self, payload))]
    pub async fn create_product(&self, payload: &Value) -> Result<Product, StoreError> {
        self.crud.create_entity(payload).await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_product(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.crud.update_entity(id, payload).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        self.crud.delete_entity(id).await
    }
}

#[async_trait]
impl EntityApi<Product> for ProductService {
    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        self.get_all().await
    }

    async fn create(&self, payload: &Value) -> Result<Product, StoreError> {
        self.create_product(payload).await
    }

    async fn update(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.update_product(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_product(id).await
    }
}
