//! Substitution variables for shell templates.

use std::collections::HashMap;

use serde_json::Value;

use super::{may_replace, normalize_key, KeyForm};

/// Variable name to substitution value.
///
/// Names are stored in canonical form; a symbol-form name (`:host`) takes
/// precedence over the string-form name (`host`) when both are supplied.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, (KeyForm, String)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let (key, form) = normalize_key(name);
        match self.values.get(&key) {
            Some((existing, _)) if !may_replace(*existing, form) => {}
            _ => {
                self.values.insert(key, (form, value.into()));
            }
        }
    }

    /// Build from a JSON object. Non-objects yield an empty set.
    ///
    /// Strings are taken raw, numbers and booleans by their JSON text.
    /// Nulls, arrays and nested objects are skipped.
    pub fn from_json(value: &Value) -> Self {
        let mut vars = Self::new();
        if let Value::Object(map) = value {
            for (name, value) in map {
                match value {
                    Value::String(s) => vars.insert(name, s.as_str()),
                    Value::Number(n) => vars.insert(name, n.to_string()),
                    Value::Bool(b) => vars.insert(name, b.to_string()),
                    Value::Null | Value::Array(_) | Value::Object(_) => {}
                }
            }
        }
        vars
    }

    /// Look up a value by canonical name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (name, value) in iter {
            vars.insert(name.as_ref(), value);
        }
        vars
    }
}
