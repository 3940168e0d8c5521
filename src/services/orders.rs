use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use crate::client::ApiClient;
use crate::entities::{Order, OrderDraft};
use crate::errors::StoreError;
use crate::services::CollectionClient;
use crate::store::EntityApi;

const ORDERS_PATH: &str = "/orders";

/// REST calls for orders.
///
/// Besides the usual collection CRUD this service owns the typed
/// [`create_order`](OrderService::create_order) call that checkout uses, so
/// the draft shape serialized to the backend is defined exactly once.
#[derive(Clone)]
pub struct OrderService {
    crud: CollectionClient,
}

impl OrderService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            crud: CollectionClient::new(api, ORDERS_PATH),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.crud.list_raw().await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Order, StoreError> {
        self.crud.fetch_entity(id).await
    }

    /// Submits a checkout draft and returns the order the backend created.
    #[instrument(skip(self, draft), fields(items = draft.item_count(), method = %draft.payment_method))]
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<Order, StoreError> {
        let payload = serde_json::to_value(draft)?;
        let order: Order = self.crud.create_entity(&payload).await?;
        info!(order_id = %order.id, "order created");
        Ok(order)
    }

    #[instrument(skip(self, payload))]
    pub async fn update_order(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.crud.update_entity(id, payload).await
    }
}

#[async_trait]
impl EntityApi<Order> for OrderService {
    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        self.get_all().await
    }

    async fn create(&self, payload: &Value) -> Result<Order, StoreError> {
        self.crud.create_entity(payload).await
    }

    async fn update(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        self.update_order(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.crud.delete_entity(id).await
    }
}
