use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::store::filter::{contains_normalized, ListFilter};
use crate::store::sort::{fold_field, FieldValue};
use crate::store::EntityRecord;

use super::{de_id, de_opt_instant};

/// Watch manufacturer (Seiko, Citizen, Orient, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(deserialize_with = "de_id", alias = "brandId", alias = "brand_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Brand {
    const COLLECTION: &'static str = keys::BRANDS;
    const LABEL: &'static str = "thương hiệu";

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
            "country" => FieldValue::Text(self.country.clone().unwrap_or_default()),
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
            let in_name = contains_normalized(&self.name, q);
            let in_country = self
                .country
                .as_deref()
                .is_some_and(|c| contains_normalized(c, q));
            if !in_name && !in_country && !self.id.contains(q) {
                return false;
            }
        }
        filter.matches_instant(self.created_at)
    }
}
