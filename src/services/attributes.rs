//! Attribute endpoints.
//!
//! Attribute types ("Dây đeo", "Mặt kính", ...) and their values live on two
//! sibling collections. Both services are kept in one module because the
//! admin screens always use them together.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::client::ApiClient;
use crate::entities::{AttributeType, AttributeValue};
use crate::errors::StoreError;
use crate::services::CollectionClient;
use crate::store::EntityApi;

const ATTRIBUTE_TYPES_PATH: &str = "/attribute-types";
const ATTRIBUTE_VALUES_PATH: &str = "/attribute-values";

#[derive(Clone)]
pub struct AttributeTypeService {
    crud: CollectionClient,
}

impl AttributeTypeService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            crud: CollectionClient::new(api, ATTRIBUTE_TYPES_PATH),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.crud.list_raw().await
    }
}

#[async_trait]
impl EntityApi<AttributeType> for AttributeTypeService {
    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        self.get_all().await
    }

    async fn create(&self, payload: &Value) -> Result<AttributeType, StoreError> {
        self.crud.create_entity(payload).await
    }

    async fn update(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.crud.update_entity(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.crud.delete_entity(id).await
    }
}

#[derive(Clone)]
pub struct AttributeValueService {
    crud: CollectionClient,
}

impl AttributeValueService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            crud: CollectionClient::new(api, ATTRIBUTE_VALUES_PATH),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.crud.list_raw().await
    }
}

#[async_trait]
impl EntityApi<AttributeValue> for AttributeValueService {
    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        self.get_all().await
    }

    async fn create(&self, payload: &Value) -> Result<AttributeValue, StoreError> {
        self.crud.create_entity(payload).await
    }

    async fn update(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.crud.update_entity(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.crud.delete_entity(id).await
    }
}
