use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::cache::keys;
use crate::store::filter::{contains_normalized, ListFilter};
use crate::store::sort::{fold_field, FieldValue};
use crate::store::EntityRecord;

use super::{de_amount, de_id, de_opt_id, de_opt_instant};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    #[serde(alias = "ACTIVE", alias = "Active")]
    Active,
    #[serde(alias = "INACTIVE", alias = "Inactive")]
    Inactive,
}

/// A watch listing as served by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "de_id", alias = "productId", alias = "product_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_amount")]
    pub price: i64,
    #[serde(default, alias = "quantity")]
    pub stock: u32,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default, deserialize_with = "de_opt_id", alias = "brand_id")]
    pub brand_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id", alias = "category_id")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "image")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Product {
    const COLLECTION: &'static str = keys::PRODUCTS;
    const LABEL: &'static str = "sản phẩm";

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn sort_value(&self, field: &str) -> FieldValue {
        match fold_field(field).as_str() {
            "name" => FieldValue::Text(self.name.clone()),
            "price" => FieldValue::Number(self.price as f64),
            "stock" | "quantity" => FieldValue::Number(self.stock as f64),
            "status" => FieldValue::Text(self.status.to_string()),
            "createdat" => self
                .created_at
                .map_or(FieldValue::Missing, FieldValue::Instant),
            "updatedat" => self
                .updated_at
                .map_or(FieldValue::Missing, FieldValue::Instant),
            _ => FieldValue::Missing,
        }
    }

    fn matches(&self, filter: &ListFilter) -> bool {
        if let Some(q) = filter.search_term() {
            if !contains_normalized(&self.name, q) && !self.id.contains(q) {
                return false;
            }
        }
        if !filter.matches_status(&self.status.to_string()) {
            return false;
        }
        if let Some(cat) = &filter.category_id {
            if self.category_id.as_deref() != Some(cat.as_str()) {
                return false;
            }
        }
        if let Some(brand) = &filter.brand_id {
            if self.brand_id.as_deref() != Some(brand.as_str()) {
                return false;
            }
        }
        if !filter.matches_amount(self.price) {
            return false;
        }
        filter.matches_instant(self.created_at)
    }
}
