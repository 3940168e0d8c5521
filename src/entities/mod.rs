// Wire-format records for the store backend.
//
// The backend is loose about scalar types: IDs arrive as strings or
// numbers (and under resource-specific keys), amounts as integers,
// floats or numeric strings, instants as RFC 3339, zoneless timestamps
// or epoch milliseconds. The helpers here absorb that variance once so
// the rest of the crate works with clean types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

pub mod attribute;
pub mod brand;
pub mod cart;
pub mod category;
pub mod customer;
pub mod order;
pub mod product;

pub use attribute::{AttributeType, AttributeValue};
pub use brand::Brand;
pub use cart::{cart_total, CartItem};
pub use category::Category;
pub use customer::Customer;
pub use order::{Order, OrderDraft, OrderDraftItem, OrderItem, OrderStatus};
pub use product::{Product, ProductStatus};

/// How the shopper pays for an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "COD", alias = "Cod")]
    Cod,
    #[serde(alias = "VNPAY", alias = "VNPay", alias = "vnPay")]
    Vnpay,
}

pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        Value::String(_) | Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string, number or null id, got {other}"
        ))),
    }
}

/// Whole-unit currency amount (VND has no minor unit).
pub(crate) fn de_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                Ok(f.round() as i64)
            } else {
                Err(serde::de::Error::custom("amount out of range"))
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.round() as i64)
            .map_err(|_| serde::de::Error::custom(format!("unparseable amount: {s:?}"))),
        Value::Null => Ok(0),
        other => Err(serde::de::Error::custom(format!(
            "expected numeric amount, got {other}"
        ))),
    }
}

pub(crate) fn de_opt_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(parse_instant(&s)),
        Value::Number(n) => Ok(n.as_i64().and_then(DateTime::from_timestamp_millis)),
        Value::Null => Ok(None),
        _ => Ok(None),
    }
}

/// Parses the timestamp spellings seen in backend payloads. Unparseable
/// values become None rather than failing the whole record.
pub(crate) fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "de_id")]
        id: String,
        #[serde(default, deserialize_with = "de_amount")]
        amount: i64,
        #[serde(default, deserialize_with = "de_opt_instant")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_numeric_and_string_ids_normalize() {
        let a: Probe = serde_json::from_str(r#"{"id": 42}"#).expect("Failed to parse numeric id");
        assert_eq!(a.id, "42");
        let b: Probe = serde_json::from_str(r#"{"id": "p-9"}"#).expect("Failed to parse string id");
        assert_eq!(b.id, "p-9");
    }

    #[test]
    fn test_amount_accepts_float_and_string() {
        let a: Probe = serde_json::from_str(r#"{"id":"x","amount": 150000.0}"#)
            .expect("Failed to parse float amount");
        assert_eq!(a.amount, 150_000);
        let b: Probe = serde_json::from_str(r#"{"id":"x","amount": "99000"}"#)
            .expect("Failed to parse string amount");
        assert_eq!(b.amount, 99_000);
    }

    #[test]
    fn test_instant_spellings() {
        let rfc: Probe = serde_json::from_str(r#"{"id":"x","at":"2024-05-01T10:00:00Z"}"#)
            .expect("Failed to parse rfc3339");
        assert!(rfc.at.is_some());
        let naive: Probe = serde_json::from_str(r#"{"id":"x","at":"2024-05-01T10:00:00.123"}"#)
            .expect("Failed to parse zoneless");
        assert!(naive.at.is_some());
        let millis: Probe = serde_json::from_str(r#"{"id":"x","at":1714557600000}"#)
            .expect("Failed to parse epoch millis");
        assert!(millis.at.is_some());
        let garbage: Probe = serde_json::from_str(r#"{"id":"x","at":"yesterday"}"#)
            .expect("Garbage timestamps should not fail the record");
        assert_eq!(garbage.at, None);
    }

    #[test]
    fn test_payment_method_wire_values() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Vnpay).expect("Failed to serialize"),
            r#""vnpay""#
        );
        let m: PaymentMethod =
            serde_json::from_str(r#""COD""#).expect("Failed to parse uppercase alias");
        assert_eq!(m, PaymentMethod::Cod);
        assert_eq!(PaymentMethod::Vnpay.to_string(), "vnpay");
    }
}
