//! Normalization of boolean-like upstream values.
//!
//! Providers encode flags such as `email_verified` as JSON booleans, as the
//! strings `"true"`/`"false"`, or as the integers `1`/`0`. [`ConvertibleBoolean`]
//! accepts all of them so profile structs can stay strict everywhere else.
//!
//! Accepted encodings:
//!
//! | true | false |
//! |------|-------|
//! | `true` | `false` |
//! | `"1"`, `"t"`, `"T"`, `"true"`, `"TRUE"`, `"True"` | `"0"`, `"f"`, `"F"`, `"false"`, `"FALSE"`, `"False"` |
//! | `1` | `0` |
//! | | `null` |
//!
//! Anything else is rejected, which surfaces as a malformed upstream response.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A boolean that deserializes from any of the provider encodings above.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConvertibleBoolean(pub bool);

impl ConvertibleBoolean {
    /// Returns the normalized value.
    #[must_use]
    pub fn get(self) -> bool {
        self.0
    }
}

impl From<ConvertibleBoolean> for bool {
    fn from(value: ConvertibleBoolean) -> Self {
        value.0
    }
}

impl From<bool> for ConvertibleBoolean {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for ConvertibleBoolean {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        normalize_bool(&value)
            .map(Self)
            .ok_or_else(|| D::Error::custom(format!("cannot interpret {value} as a boolean")))
    }
}

/// Normalizes a JSON value into a boolean.
///
/// Returns `None` for values that are not a recognised boolean encoding.
#[must_use]
pub fn normalize_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => parse_bool_str(s),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_bool_str(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
