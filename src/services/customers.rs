use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::client::ApiClient;
use crate::entities::Customer;
use crate::errors::StoreError;
use crate::services::CollectionClient;
use crate::store::EntityApi;

// Customer accounts live on the user collection, the admin screens just
// present them as "khách hàng".
const USERS_PATH: &str = "/users";

#[derive(Clone)]
pub struct CustomerService {
    crud: CollectionClient,
}

impl CustomerService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            crud: CollectionClient::new(api, USERS_PATH),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.crud.list_raw().await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Customer, StoreError> {
        self.crud.fetch_entity(id).await
    }
}

#[async_trait]
impl EntityApi<Customer> for CustomerService {
    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        self.get_all().await
    }

    async fn create(&self, payload: &Value) -> Result<Customer, StoreError> {
        self.crud.create_entity(payload).await
    }

    async fn update(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.crud.update_entity(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.crud.delete_entity(id).await
    }
}
