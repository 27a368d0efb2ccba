use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A configured data source as stored in the metadata store: its registry
/// key (`source_type`, `version`) plus free-form connection properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSourceSpec {
    pub name: String,
    pub source_type: String,
    pub version: Option<i64>,
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl DataSourceSpec {
    pub fn new(
        name: impl Into<String>,
        source_type: impl Into<String>,
        version: Option<i64>,
    ) -> Self {
        DataSourceSpec {
            name: name.into(),
            source_type: source_type.into(),
            version,
            properties: serde_json::Value::Null,
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    pub fn prop_path(&self, key: &str) -> Option<PathBuf> {
        self.prop_str(key).map(PathBuf::from)
    }
}

/// A saved query, addressable by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub query: String,
}

/// A published entry point that resolves to a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointSpec {
    pub name: String,
    pub model: String,
}
