use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::cache::keys;
use crate::store::filter::{contains_normalized, ListFilter};
use crate::store::sort::{fold_field, FieldValue};
use crate::store::EntityRecord;

use super::{de_amount, de_id, de_opt_id, de_opt_instant, PaymentMethod};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    #[serde(alias = "PENDING", alias = "Pending")]
    Pending,
    #[serde(alias = "CONFIRMED", alias = "Confirmed")]
    Confirmed,
    #[serde(alias = "PROCESSING", alias = "Processing")]
    Processing,
    #[serde(alias = "SHIPPING", alias = "Shipping")]
    Shipping,
    #[serde(alias = "DELIVERED", alias = "Delivered")]
    Delivered,
    #[serde(alias = "CANCELLED", alias = "Cancelled", alias = "canceled")]
    Cancelled,
}

/// One line of an order, snapshotting the product at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, deserialize_with = "de_opt_id", alias = "product_id")]
    pub product_id: Option<String>,
    #[serde(default, alias = "productName", alias = "product_name")]
    pub name: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub price: i64,
    #[serde(default)]
    pub quantity: u32,
}

/// A placed order as listed in the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "de_id", alias = "orderId", alias = "order_id")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "de_opt_id",
        alias = "user_id",
        alias = "customerId",
        alias = "customer_id"
    )]
    pub user_id: Option<String>,
    #[serde(default, alias = "receiver_name")]
    pub receiver_name: String,
    #[serde(default, alias = "receiver_phone")]
    pub receiver_phone: String,
    #[serde(default, alias = "receiver_address")]
    pub receiver_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "de_amount", alias = "total_amount", alias = "total")]
    pub total_amount: i64,
    #[serde(default, alias = "payment_method")]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "transaction_id"
    )]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "bank_code")]
    pub bank_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Order {
    const COLLECTION: &'static str = keys::ORDERS;
    const LABEL: &'static str = "đơn hàng";

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
            "receivername" => FieldValue::Text(self.receiver_name.clone()),
            "totalamount" | "total" => FieldValue::Number(self.total_amount as f64),
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
            let in_receiver = contains_normalized(&self.receiver_name, q);
            let in_phone = self.receiver_phone.contains(q);
            if !in_receiver && !in_phone && !self.id.contains(q) {
                return false;
            }
        }
        if !filter.matches_status(&self.status.to_string()) {
            return false;
        }
        if !filter.matches_amount(self.total_amount) {
            return false;
        }
        filter.matches_instant(self.created_at)
    }
}

/// Payload for creating an order, shared by direct COD checkout and
/// gateway finalization (where it travels through the staged record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub user_id: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub items: Vec<OrderDraftItem>,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraftItem {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
}

impl OrderDraft {
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_wire_tolerance() {
        let raw = r#"{
            "orderId": 101,
            "customerId": "u-8",
            "receiverName": "Trần Văn B",
            "receiverPhone": "0912345678",
            "receiverAddress": "12 Lý Thường Kiệt",
            "total": 4500000.0,
            "paymentMethod": "VNPAY",
            "status": "CONFIRMED",
            "createdAt": "2024-03-10T08:30:00Z"
        }"#;
        let order: Order = serde_json::from_str(raw).expect("Failed to parse order");
        assert_eq!(order.id, "101");
        assert_eq!(order.user_id.as_deref(), Some("u-8"));
        assert_eq!(order.total_amount, 4_500_000);
        assert_eq!(order.payment_method, PaymentMethod::Vnpay);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_draft_item_count() {
        let draft = OrderDraft {
            user_id: "u1".into(),
            receiver_name: "A".into(),
            receiver_phone: "0900000000".into(),
            receiver_address: "HN".into(),
            note: None,
            items: vec![
                OrderDraftItem {
                    product_id: "p1".into(),
                    name: "SKX007".into(),
                    price: 5_000_000,
                    quantity: 2,
                },
                OrderDraftItem {
                    product_id: "p2".into(),
                    name: "SNK809".into(),
                    price: 2_000_000,
                    quantity: 1,
                },
            ],
            total_amount: 12_000_000,
            payment_method: PaymentMethod::Cod,
            status: OrderStatus::Pending,
            transaction_id: None,
            bank_code: None,
        };
        assert_eq!(draft.item_count(), 3);
    }
}
