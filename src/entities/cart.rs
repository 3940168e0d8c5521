use serde::{Deserialize, Serialize};

use super::order::OrderDraftItem;
use super::{de_amount, de_id, de_opt_id};

/// One line of a shopper's cart, with the product snapshot flattened in
/// the way the cart endpoints serve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(
        deserialize_with = "de_id",
        alias = "cartItemId",
        alias = "cart_item_id",
        alias = "itemId"
    )]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id", alias = "product_id")]
    pub product_id: Option<String>,
    #[serde(default, alias = "productName", alias = "product_name")]
    pub name: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub price: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "thumbnail")]
    pub image: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl CartItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }

    pub fn to_draft_item(&self) -> OrderDraftItem {
        OrderDraftItem {
            product_id: self.product_id.clone().unwrap_or_default(),
            name: self.name.clone(),
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// Order total across cart lines.
pub fn cart_total(items: &[CartItem]) -> i64 {
    items.iter().map(CartItem::line_total).sum()
}
