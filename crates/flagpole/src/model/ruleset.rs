use serde::{Deserialize, Serialize};

use super::flag::Flag;
use crate::error::FlagpoleError;

/// The full document of flags and rules fetched from the distribution, and
/// the unit cached as one serialized blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    pub version: String,
    pub flags: Vec<Flag>,
}

impl RuleSet {
    /// Parses a serialized rule-set document, validating the top-level shape
    /// before decoding the flags.
    pub fn parse(raw: &str) -> Result<RuleSet, FlagpoleError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let document = value
            .as_object()
            .ok_or_else(|| FlagpoleError::InvalidRules("rule set must be an object".to_string()))?;

        if !document.get("version").is_some_and(serde_json::Value::is_string) {
            return Err(FlagpoleError::InvalidRules(
                "rule set is missing a string `version`".to_string(),
            ));
        }
        if !document.get("flags").is_some_and(serde_json::Value::is_array) {
            return Err(FlagpoleError::InvalidRules(
                "rule set is missing a `flags` array".to_string(),
            ));
        }

        Ok(serde_json::from_value(value)?)
    }
}
