use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::normalize_text;
use super::EntityRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc", alias = "ascend")]
    Ascending,
    #[serde(alias = "desc", alias = "descend")]
    Descending,
}

/// Active sort of a list view. Table headers hand over whatever field
/// spelling the backend used, so comparison folds the field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

impl Default for SortKey {
    // Newest records first, the back-office default view.
    fn default() -> Self {
        Self::descending("createdAt")
    }
}

/// A record field lifted into a comparable shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Instant(DateTime<Utc>),
    Missing,
}

/// Folds a sort-field spelling: lowercase, underscores dropped, so
/// "createdAt", "created_at" and "CreatedAt" all address the same field.
pub fn fold_field(field: &str) -> String {
    field
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Field comparison before direction is applied. Text compares
/// case- and diacritic-insensitively; an absent instant counts as the
/// epoch; values of unrelated kinds tie.
pub fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    use FieldValue::*;
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    match (a, b) {
        (Text(x), Text(y)) => normalize_text(x).cmp(&normalize_text(y)),
        (Number(x), Number(y)) => x.total_cmp(y),
        (Instant(x), Instant(y)) => x.cmp(y),
        (Instant(x), Missing) => x.cmp(&epoch),
        (Missing, Instant(y)) => epoch.cmp(y),
        (Text(x), Missing) => normalize_text(x).cmp(&String::new()),
        (Missing, Text(y)) => String::new().cmp(&normalize_text(y)),
        (Number(x), Missing) => x.total_cmp(&0.0),
        (Missing, Number(y)) => 0.0f64.total_cmp(y),
        (Missing, Missing) => Ordering::Equal,
        _ => Ordering::Equal,
    }
}

/// Sorts a list in place. Recently-touched records come first whatever
/// the direction; the direction only ever reverses the field comparison.
pub fn sort_records<R: EntityRecord>(
    records: &mut [R],
    key: &SortKey,
    is_touched: impl Fn(&str) -> bool,
) {
    records.sort_by(|a, b| {
        match (is_touched(a.id()), is_touched(b.id())) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => {
                let ord = compare_values(&a.sort_value(&key.field), &b.sort_value(&key.field));
                match key.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Product, ProductStatus};
    use chrono::TimeZone;

    fn product(id: &str, name: &str, price: i64, created: Option<DateTime<Utc>>) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            description: None,
            price,
            stock: 0,
            status: ProductStatus::Active,
            brand_id: None,
            category_id: None,
            thumbnail: None,
            created_at: created,
            updated_at: None,
        }
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_fold_field_spellings() {
        assert_eq!(fold_field("createdAt"), "createdat");
        assert_eq!(fold_field("created_at"), "createdat");
        assert_eq!(fold_field("TotalAmount"), "totalamount");
    }

    #[test]
    fn test_text_sort_ignores_case_and_marks() {
        let mut items = vec![
            product("1", "citizen", 1, None),
            product("2", "Đồng hồ", 1, None),
            product("3", "Casio", 1, None),
        ];
        sort_records(&mut items, &SortKey::ascending("name"), |_| false);
        assert_eq!(ids(&items), ["3", "1", "2"]);
    }

    #[test]
    fn test_touched_records_lead_even_descending() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut items = vec![
            product("old", "a", 1, Some(t1)),
            product("new", "b", 1, Some(t2)),
            product("edited", "c", 1, None),
        ];
        sort_records(&mut items, &SortKey::descending("createdAt"), |id| {
            id == "edited"
        });
        // "edited" has no timestamp at all, yet pinning wins.
        assert_eq!(ids(&items), ["edited", "new", "old"]);
    }

    #[test]
    fn test_missing_instant_counts_as_epoch() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut items = vec![
            product("dated", "a", 1, Some(t)),
            product("undated", "b", 1, None),
        ];
        sort_records(&mut items, &SortKey::ascending("createdAt"), |_| false);
        assert_eq!(ids(&items), ["undated", "dated"]);
        sort_records(&mut items, &SortKey::descending("createdAt"), |_| false);
        assert_eq!(ids(&items), ["dated", "undated"]);
    }

    #[test]
    fn test_descending_reverses_field_only() {
        let mut items = vec![
            product("cheap", "x", 100, None),
            product("mid", "y", 500, None),
            product("dear", "z", 900, None),
        ];
        sort_records(&mut items, &SortKey::descending("price"), |id| id == "cheap");
        assert_eq!(ids(&items), ["cheap", "dear", "mid"]);
    }

    #[test]
    fn test_unknown_field_keeps_original_order() {
        let mut items = vec![
            product("a", "x", 1, None),
            product("b", "y", 2, None),
        ];
        sort_records(&mut items, &SortKey::ascending("nonsense"), |_| false);
        assert_eq!(ids(&items), ["a", "b"]);
    }
}
