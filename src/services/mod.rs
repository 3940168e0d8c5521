//! Remote service wrappers.
//!
//! Each service owns the REST paths for one backend collection and exposes
//! the typed calls the stores and the checkout flow need. All of them speak
//! through [`ApiClient`](crate::client::ApiClient), so session headers and
//! transport error mapping stay in one place.

// Catalog services
pub mod attributes;
pub mod brands;
pub mod categories;
pub mod products;

// Sales services
pub mod cart;
pub mod customers;
pub mod orders;

pub use attributes::{AttributeTypeService, AttributeValueService};
pub use brands::BrandService;
pub use cart::CartService;
pub use categories::CategoryService;
pub use customers::CustomerService;
pub use orders::OrderService;
pub use products::ProductService;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ApiClient;
use crate::errors::StoreError;

/// Pulls the record array out of whichever envelope the backend used.
///
/// The admin endpoints answer with a bare array, the storefront ones wrap
/// the same data in `{ "data": [...] }` or `{ "items": [...] }` depending on
/// which controller handled the call.
pub(crate) fn unwrap_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in ["data", "items", "content", "results"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Unwraps a single-record envelope such as `{ "data": { ... } }`.
pub(crate) fn unwrap_entity(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        for key in ["data", "result"] {
            if map.get(key).is_some_and(Value::is_object) {
                if let Some(inner) = map.remove(key) {
                    return inner;
                }
            }
        }
    }
    value
}

/// Shared CRUD plumbing for one REST collection.
///
/// The per-domain services delegate here so the path handling and envelope
/// unwrapping are written once.
#[derive(Clone)]
pub(crate) struct CollectionClient {
    api: Arc<ApiClient>,
    path: &'static str,
}

impl CollectionClient {
    pub(crate) fn new(api: Arc<ApiClient>, path: &'static str) -> Self {
        Self { api, path }
    }

    pub(crate) fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    pub(crate) async fn list_raw(&self) -> Result<Vec<Value>, StoreError> {
        let value: Value = self.api.get(self.path).await?;
        Ok(unwrap_list(value))
    }

    pub(crate) async fn fetch_entity<R: DeserializeOwned>(&self, id: &str) -> Result<R, StoreError> {
        let value: Value = self.api.get(&self.item_path(id)).await?;
        Ok(serde_json::from_value(unwrap_entity(value))?)
    }

    pub(crate) async fn create_entity<R: DeserializeOwned>(
        &self,
        payload: &Value,
    ) -> Result<R, StoreError> {
        let value: Value = self.api.post(self.path, payload).await?;
        Ok(serde_json::from_value(unwrap_entity(value))?)
    }

    pub(crate) async fn update_entity(&self, id: &str, payload: &Value) -> Result<(), StoreError> {
        let _: Value = self.api.put(&self.item_path(id), payload).await?;
        Ok(())
    }

    pub(crate) async fn delete_entity(&self, id: &str) -> Result<(), StoreError> {
        self.api.delete(&self.item_path(id)).await
    }
}
