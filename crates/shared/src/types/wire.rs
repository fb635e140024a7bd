//! Lenient wire helpers.
//!
//! The backend is loosely typed: ids arrive as numbers or strings, amounts as
//! numbers or form text, optional references as `""`, `0` or `null`. These
//! helpers normalize all of that at the deserialization boundary.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Normalizes an id-like JSON value to its string form.
///
/// Returns `None` for empty strings, `null`, booleans, arrays and objects.
#[must_use]
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => n
            .as_i64()
            .map(|v| v.to_string())
            .or_else(|| n.as_u64().map(|v| v.to_string()))
            .or_else(|| Some(n.to_string())),
        _ => None,
    }
}

/// Like [`id_from_value`], but zero and non-positive numeric ids are absent.
#[must_use]
pub fn positive_id_from_value(value: &Value) -> Option<String> {
    let id = id_from_value(value)?;
    match Decimal::from_str(&id) {
        Ok(numeric) if numeric <= Decimal::ZERO => None,
        _ => Some(id),
    }
}

/// Coerces a JSON number or numeric text to a decimal; anything else is zero.
#[must_use]
pub fn decimal_from_value(value: &Value) -> Decimal {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Decimal::ZERO,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .unwrap_or(Decimal::ZERO)
}

/// Deserializes an id that may be a number, a string, or missing (empty).
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(id_from_value).unwrap_or_default())
}

/// Deserializes an optional id reference.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(id_from_value))
}

/// Deserializes an optional reference where empty, zero and non-positive mean absent.
pub fn deserialize_optional_positive_id<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(positive_id_from_value))
}

/// Deserializes an amount leniently; non-numeric input becomes zero.
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().map_or(Decimal::ZERO, decimal_from_value))
}

/// Deserializes optional text, mapping blank strings to `None`.
pub fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Deserializes required text leniently; `null` and blanks become empty.
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_text(deserializer)?.unwrap_or_default())
}

/// Deserializes an optional JSON object, also accepted as serialized text.
pub fn deserialize_optional_object<'de, D>(
    deserializer: D,
) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Object(map)) => Some(map),
        Some(Value::String(text)) => match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    })
}

/// Deserializes an optional integer sent as a number or numeric text.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
