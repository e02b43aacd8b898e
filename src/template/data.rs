use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Data handed from a page handler to template execution.
///
/// Created per request, enriched by [`DataMerger`](super::DataMerger), then
/// dropped once the response is written. Empty strings and missing map keys
/// count as "not set" for merging purposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateData {
    #[serde(default)]
    pub string_map: HashMap<String, String>,

    #[serde(default)]
    pub int_map: HashMap<String, i64>,

    #[serde(default)]
    pub float_map: HashMap<String, f32>,

    /// Arbitrary structured values
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub csrf_token: String,

    #[serde(default)]
    pub flash: String,

    #[serde(default)]
    pub warning: String,

    #[serde(default)]
    pub error: String,
}

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_map.insert(key.into(), value.into());
        self
    }

    pub fn with_int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.int_map.insert(key.into(), value);
        self
    }

    pub fn with_float(mut self, key: impl Into<String>, value: f32) -> Self {
        self.float_map.insert(key.into(), value);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Whether the string map holds a non-empty value for `key`
    pub fn has_string(&self, key: &str) -> bool {
        self.string_map.get(key).is_some_and(|v| !v.is_empty())
    }
}
