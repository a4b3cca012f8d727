//! Domain records exchanged with the marketplace API.

pub mod payment;
pub mod product;
pub mod user;

pub use payment::*;
pub use product::*;
pub use user::*;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server-assigned identifier.
///
/// The backend emits numeric primary keys for some resources and string
/// identifiers (UUIDs, payment references) for others; both are normalised
/// to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(Self(text)),
            Value::Number(num) => Ok(Self(num.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {other}"
            ))),
        }
    }
}

/// Deserialize an optional decimal that may arrive as a JSON string or number.
pub(crate) fn decimal_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(num)) => Ok(Some(num.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected decimal string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_accepts_numbers_and_strings() {
        let numeric: EntityId = serde_json::from_str("42").unwrap();
        let text: EntityId = serde_json::from_str("\"pay-7\"").unwrap();
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.to_string(), "pay-7");
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "\"42\"");
    }

    #[test]
    fn entity_id_rejects_objects() {
        assert!(serde_json::from_str::<EntityId>("{}").is_err());
    }
}
