use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::store::filter::{contains_normalized, ListFilter};
use crate::store::sort::{fold_field, FieldValue};
use crate::store::EntityRecord;

use super::{de_id, de_opt_instant};

/// Registered shopper account as listed in the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(
        deserialize_with = "de_id",
        alias = "userId",
        alias = "user_id",
        alias = "customerId",
        alias = "customer_id"
    )]
    pub id: String,
    #[serde(default, alias = "name", alias = "full_name")]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Customer {
    const COLLECTION: &'static str = keys::CUSTOMERS;
    const LABEL: &'static str = "khách hàng";

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
            "fullname" | "name" => FieldValue::Text(self.full_name.clone()),
            "email" => FieldValue::Text(self.email.clone().unwrap_or_default()),
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
            let in_name = contains_normalized(&self.full_name, q);
            let in_email = self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&q.to_lowercase()));
            let in_phone = self.phone.as_deref().is_some_and(|p| p.contains(q));
            if !in_name && !in_email && !in_phone && !self.id.contains(q) {
                return false;
            }
        }
        if let Some(wanted) = &filter.status {
            let actual = self.status.as_deref().unwrap_or("");
            if !actual.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        filter.matches_instant(self.created_at)
    }
}
