use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::client::ApiClient;
use crate::entities::CartItem;
use crate::errors::StoreError;
use crate::services::unwrap_list;

/// REST calls for a customer's shopping cart.
///
/// The cart is keyed by user, not by session, so every call takes the owning
/// user id and builds the nested `/users/{id}/cart` path.
#[derive(Clone)]
pub struct CartService {
    api: Arc<ApiClient>,
}

impl CartService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    fn cart_path(user_id: &str) -> String {
        format!("/users/{user_id}/cart")
    }

    /// Fetches the cart, skipping lines that fail to parse.
    ///
    /// A malformed line (usually a product that was deleted server side)
    /// should not take the whole cart down with it.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: &str) -> Result<Vec<CartItem>, StoreError> {
        let value: Value = self.api.get(&Self::cart_path(user_id)).await?;
        let items = unwrap_list(value)
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<CartItem>(raw) {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!(%err, "skipping unreadable cart line");
                    None
                }
            })
            .collect();
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let payload = json!({ "productId": product_id, "quantity": quantity });
        let _: Value = self.api.post(&Self::cart_path(user_id), &payload).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        self.api
            .delete(&format!("{}/{item_id}", Self::cart_path(user_id)))
            .await
    }

    /// Empties the cart after a successful checkout.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: &str) -> Result<(), StoreError> {
        self.api.delete(&Self::cart_path(user_id)).await?;
        info!(%user_id, "cart cleared");
        Ok(())
    }
}
