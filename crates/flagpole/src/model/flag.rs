//! # Flag Model
//!
//! Immutable flag value objects as served by the rule distribution.
//!
//! A [`Flag`] is never mutated: evaluating it against a context produces a
//! new instance with the target value replaced when a rule matches, and
//! synthetic flags are constructed from default values when a key is absent
//! from the loaded rule set.

use serde::{Deserialize, Serialize};

use super::rule::Rule;
use super::value::{FlagValue, ValuePayload};

/// The value type a flag is declared with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Boolean,
    String,
    Number,
}

impl FlagKind {
    fn of(value: &FlagValue) -> Self {
        match value {
            FlagValue::Bool(_) => FlagKind::Boolean,
            FlagValue::String(_) => FlagKind::String,
            FlagValue::Number(_) => FlagKind::Number,
        }
    }
}

/// Wrapper around a value payload, shared by flag targets and rule override
/// values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueEnvelope {
    pub value: ValuePayload,
}

impl From<FlagValue> for ValueEnvelope {
    fn from(value: FlagValue) -> Self {
        ValueEnvelope {
            value: value.into(),
        }
    }
}

/// The currently-effective value envelope of a flag, with optional schedule
/// metadata. The timestamps are carried through verbatim for callers; the
/// client does not interpret them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub value: ValueEnvelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<serde_json::Value>,
}

/// A named configuration value with a declared type, a baseline target and
/// optional targeting rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub key: String,
    pub name: String,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl Flag {
    /// Builds a synthetic flag from a default value, used when the key is
    /// absent from the loaded rule set. The kind is inferred from the value.
    pub fn synthesized(key: &str, value: FlagValue) -> Self {
        Flag {
            version: "0".to_string(),
            kind: FlagKind::of(&value),
            key: key.to_string(),
            name: key.to_string(),
            target: Target {
                version: None,
                value: value.into(),
                expires_at: None,
                published_at: None,
                scheduled_at: None,
            },
            rules: Vec::new(),
        }
    }

    /// Rebuilds this flag with the target value replaced by a matched rule's
    /// override. All other target metadata is inherited unchanged.
    pub fn with_target_value(&self, value: ValueEnvelope) -> Self {
        Flag {
            target: Target {
                value,
                ..self.target.clone()
            },
            ..self.clone()
        }
    }

    /// The resolved value of the current target, if any.
    pub fn value(&self) -> Option<FlagValue> {
        self.target.value.value.resolve()
    }

    /// True when the flag resolves to boolean `true`.
    pub fn is_enabled(&self) -> bool {
        self.as_bool().unwrap_or(false)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value().and_then(|v| v.as_bool())
    }

    pub fn as_string(&self) -> Option<String> {
        self.value().and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn as_number(&self) -> Option<f64> {
        self.value().and_then(|v| v.as_number())
    }
}
