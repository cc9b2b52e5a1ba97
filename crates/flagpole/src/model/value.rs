//! # Flag Values
//!
//! Typed flag values and their wire representation.
//!
//! On the wire a value is a union object carrying at most one of the keys
//! `boolean`, `string`, `number`. [`ValuePayload`] mirrors that shape exactly;
//! [`FlagValue`] is the resolved, tagged form used everywhere else in the
//! crate. When a payload carries more than one key, resolution order is
//! boolean, then string, then number.

use serde::{Deserialize, Serialize};

/// A resolved flag value: one of the three types the service supports.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Number(f64),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FlagValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::String(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Number(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Number(value as f64)
    }
}

/// Wire-level value union. At most one key is expected to be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValuePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
}

impl ValuePayload {
    /// Resolves the union into a tagged value. Preference order when more
    /// than one key is present: boolean, then string, then number.
    pub fn resolve(&self) -> Option<FlagValue> {
        if let Some(boolean) = self.boolean {
            return Some(FlagValue::Bool(boolean));
        }
        if let Some(string) = &self.string {
            return Some(FlagValue::String(string.clone()));
        }
        self.number.map(FlagValue::Number)
    }
}

impl From<FlagValue> for ValuePayload {
    fn from(value: FlagValue) -> Self {
        match value {
            FlagValue::Bool(boolean) => ValuePayload {
                boolean: Some(boolean),
                ..Default::default()
            },
            FlagValue::String(string) => ValuePayload {
                string: Some(string),
                ..Default::default()
            },
            FlagValue::Number(number) => ValuePayload {
                number: Some(number),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_preference_order() {
        let payload = ValuePayload {
            boolean: Some(true),
            string: Some("fallback".to_string()),
            number: Some(1.0),
        };
        assert_eq!(payload.resolve(), Some(FlagValue::Bool(true)));

        let payload = ValuePayload {
            boolean: None,
            string: Some("fallback".to_string()),
            number: Some(1.0),
        };
        assert_eq!(
            payload.resolve(),
            Some(FlagValue::String("fallback".to_string()))
        );

        let payload = ValuePayload {
            number: Some(1.0),
            ..Default::default()
        };
        assert_eq!(payload.resolve(), Some(FlagValue::Number(1.0)));

        assert_eq!(ValuePayload::default().resolve(), None);
    }

    #[test]
    fn test_wire_round_trip_omits_absent_keys() {
        let payload: ValuePayload = FlagValue::Bool(false).into();
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"boolean":false}"#);

        let parsed: ValuePayload = serde_json::from_str(r#"{"number":42.5}"#).unwrap();
        assert_eq!(parsed.resolve(), Some(FlagValue::Number(42.5)));
    }
}
