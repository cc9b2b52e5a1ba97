use serde::{Deserialize, Serialize};

use super::flag::ValueEnvelope;

/// One targeting entry: a condition (or conjunction of conditions) and the
/// value applied when it matches. A rule with no conditions at all matches
/// unconditionally and is typically placed last as a catch-all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clauses: Vec<Condition>,
    pub value: ValueEnvelope,
}

/// A single attribute comparison within a rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

/// Comparison operators supported by the rule engine. Operators this client
/// does not know deserialize to [`Operator::Unknown`] and never match, so a
/// newer rule set does not break older clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    In,
    NotIn,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    #[serde(other)]
    Unknown,
}

/// A condition target: either a bare string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConditionValue {
    One(String),
    Many(Vec<String>),
}

impl ConditionValue {
    /// The target for single-valued operators. A list target contributes its
    /// first element.
    pub fn single(&self) -> Option<&str> {
        match self {
            ConditionValue::One(value) => Some(value),
            ConditionValue::Many(values) => values.first().map(String::as_str),
        }
    }

    /// The target list for membership operators. A bare value is treated as
    /// a singleton list.
    pub fn list(&self) -> &[String] {
        match self {
            ConditionValue::One(value) => std::slice::from_ref(value),
            ConditionValue::Many(values) => values,
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::One(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_operator_deserializes() {
        let condition: Condition = serde_json::from_str(
            r#"{"attribute":"country","operator":"matches_regex","value":"US"}"#,
        )
        .unwrap();
        assert_eq!(condition.operator, Operator::Unknown);
    }

    #[test]
    fn test_condition_value_shapes() {
        let one: ConditionValue = serde_json::from_str(r#""US""#).unwrap();
        assert_eq!(one.single(), Some("US"));
        assert_eq!(one.list(), ["US".to_string()]);

        let many: ConditionValue = serde_json::from_str(r#"["US","CA"]"#).unwrap();
        assert_eq!(many.single(), Some("US"));
        assert_eq!(many.list().len(), 2);

        let empty: ConditionValue = serde_json::from_str(r#"[]"#).unwrap();
        assert_eq!(empty.single(), None);
        assert!(empty.list().is_empty());
    }

    #[test]
    fn test_rule_without_conditions_deserializes() {
        let rule: Rule =
            serde_json::from_str(r#"{"value":{"value":{"boolean":true}}}"#).unwrap();
        assert!(rule.criteria.is_none());
        assert!(rule.clauses.is_empty());
    }
}
