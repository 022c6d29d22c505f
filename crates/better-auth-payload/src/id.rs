// Document identifiers.
//
// Payload assigns text ids (MongoDB ObjectIds, UUIDs) or numeric ids (serial
// Postgres/SQLite keys) depending on the database behind it. better-auth
// records carry whichever the collection uses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The id representation the Payload collections use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    #[default]
    Text,
    Number,
}

impl IdType {
    /// Coerce an id value to this representation. Values that cannot be
    /// converted are returned unchanged.
    pub fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (IdType::Text, Value::Number(n)) => Value::String(n.to_string()),
            (IdType::Number, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            (IdType::Number, Value::Array(items)) | (IdType::Text, Value::Array(items)) => {
                Value::Array(items.into_iter().map(|v| self.coerce(v)).collect())
            }
            (_, other) => other,
        }
    }
}

/// A single document id, as used by point lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentId {
    Text(String),
    Number(i64),
}

impl DocumentId {
    /// Extract an id from a scalar JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Number),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => Value::from(*n),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for DocumentId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}
