use std::collections::HashMap;

use serde_json::Value as JsonValue;

/// Options for constructing a [`crate::Connection`].
///
/// There is exactly one logical connection per process in the systems this
/// adapter targets; construct the config once at startup and hand it to the
/// single connection constructor.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Connection name, surfaced through `get_config("name")` style lookups.
    pub name: String,
    /// Prefix applied to every table the grammars wrap.
    pub table_prefix: String,
    /// Loosely-typed driver options.
    pub options: HashMap<String, JsonValue>,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_prefix: String::new(),
            options: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Look up a config value by key. `"name"` and `"prefix"` resolve to the
    /// dedicated fields; everything else comes from `options`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        match key {
            "name" => Some(JsonValue::String(self.name.clone())),
            "prefix" => Some(JsonValue::String(self.table_prefix.clone())),
            other => self.options.get(other).cloned(),
        }
    }
}
