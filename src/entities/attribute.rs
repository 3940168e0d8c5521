// Attribute metadata: a type names a specification axis (movement,
// strap material, water resistance), a value is one entry on that axis.
//
// The backend keys attribute IDs inconsistently across endpoints
// (attrTypeId, attr_type_id, attributeTypeId); every spelling lands on
// the plain `id` field here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::store::filter::{contains_normalized, ListFilter};
use crate::store::sort::{fold_field, FieldValue};
use crate::store::EntityRecord;

use super::{de_id, de_opt_id, de_opt_instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeType {
    #[serde(
        deserialize_with = "de_id",
        alias = "attrTypeId",
        alias = "attr_type_id",
        alias = "attributeTypeId"
    )]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityRecord for AttributeType {
    const COLLECTION: &'static str = keys::ATTRIBUTE_TYPES;
    const LABEL: &'static str = "loại thuộc tính";

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
        filter.matches_instant(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    #[serde(
        deserialize_with = "de_id",
        alias = "attrValueId",
        alias = "attr_value_id",
        alias = "attributeValueId"
    )]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "de_opt_id",
        alias = "attr_type_id",
        alias = "attributeTypeId"
    )]
    pub attr_type_id: Option<String>,
    #[serde(default, alias = "name")]
    pub value: String,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_instant", alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityRecord for AttributeValue {
    const COLLECTION: &'static str = keys::ATTRIBUTE_VALUES;
    const LABEL: &'static str = "giá trị thuộc tính";

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
            "value" | "name" => FieldValue::Text(self.value.clone()),
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
            if !contains_normalized(&self.value, q) && !self.id.contains(q) {
                return false;
            }
        }
        if let Some(parent) = &filter.parent_id {
            if self.attr_type_id.as_deref() != Some(parent.as_str()) {
                return false;
            }
        }
        filter.matches_instant(self.created_at)
    }
}
