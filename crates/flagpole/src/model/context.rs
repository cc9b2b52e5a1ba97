use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named, multi-valued piece of context data. A clause matches when any of
/// the values satisfies it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub values: Vec<String>,
}

/// The caller-supplied entity a rule set is evaluated against.
///
/// # Example
///
/// ```rust
/// use flagpole::Context;
///
/// let context = Context::new("user")
///     .with_identifier("user-123")
///     .with_attribute("country", ["US"])
///     .with_attribute("tags", ["beta", "internal"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Context {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Attribute>,
}

impl Context {
    pub fn new(kind: impl Into<String>) -> Self {
        Context {
            kind: kind.into(),
            name: None,
            identifier: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Sets an attribute. Setting the same key again replaces the previous
    /// values.
    pub fn with_attribute<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = key.into();
        let attribute = Attribute {
            key: key.clone(),
            values: values.into_iter().map(Into::into).collect(),
        };
        self.attributes.insert(key, attribute);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes.get(key)
    }
}

impl Default for Context {
    /// An anonymous user context with no attributes.
    fn default() -> Self {
        Context::new("user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_set_attribute_wins() {
        let context = Context::new("user")
            .with_attribute("country", ["US"])
            .with_attribute("country", ["CA"]);

        let attribute = context.attribute("country").unwrap();
        assert_eq!(attribute.values, ["CA".to_string()]);
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let context = Context::new("organization");
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["type"], "organization");
        assert!(json.get("name").is_none());
        assert!(json.get("identifier").is_none());
    }
}
