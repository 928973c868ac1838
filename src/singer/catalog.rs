use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Metadata attached to a breadcrumb: `[]` for the stream, `["properties", name]` for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub breadcrumb: Vec<String>,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tap_stream_id: String,
    pub stream: String,
    pub schema: Value,
    #[serde(default)]
    pub key_properties: Vec<String>,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Loads a catalog file, as written by `--discover` and edited for selection.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            AppError::JsonError(format!("Invalid catalog {}: {e}", path.display()))
        })
    }

    pub fn get_stream(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|entry| entry.tap_stream_id == tap_stream_id)
    }
}

impl CatalogEntry {
    /// Builds the discovered entry with standard metadata.
    ///
    /// Key properties are always included; every other property is available
    /// and selected unless deselected in the catalog.
    pub fn discovered(stream: &str, schema: Value, key_properties: &[&str]) -> Self {
        let mut metadata = vec![MetadataEntry {
            breadcrumb: Vec::new(),
            metadata: object(json!({
                "inclusion": "available",
                "selected-by-default": true,
                "table-key-properties": key_properties,
                "forced-replication-method": "FULL_TABLE",
            })),
        }];

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for name in properties.keys() {
                let entry = if key_properties.contains(&name.as_str()) {
                    json!({"inclusion": "automatic"})
                } else {
                    json!({"inclusion": "available", "selected-by-default": true})
                };
                metadata.push(MetadataEntry {
                    breadcrumb: vec!["properties".into(), name.clone()],
                    metadata: object(entry),
                });
            }
        }

        Self {
            tap_stream_id: stream.to_string(),
            stream: stream.to_string(),
            schema,
            key_properties: key_properties.iter().map(|k| k.to_string()).collect(),
            metadata,
            replication_method: Some("FULL_TABLE".into()),
        }
    }

    fn metadata_for(&self, breadcrumb: &[&str]) -> Option<&Map<String, Value>> {
        self.metadata
            .iter()
            .find(|entry| entry.breadcrumb.iter().map(String::as_str).eq(breadcrumb.iter().copied()))
            .map(|entry| &entry.metadata)
    }

    /// Stream selection: explicit `selected` wins, then `selected-by-default`.
    pub fn is_selected(&self) -> bool {
        self.metadata_for(&[]).is_some_and(is_selected)
    }

    /// Whether `property` is emitted. Automatic properties cannot be deselected and
    /// properties without metadata are kept.
    pub fn is_property_selected(&self, property: &str) -> bool {
        match self.metadata_for(&["properties", property]) {
            None => true,
            Some(metadata) => {
                metadata.get("inclusion").and_then(Value::as_str) == Some("automatic")
                    || metadata.get("selected").and_then(Value::as_bool) != Some(false)
            }
        }
    }
}

fn is_selected(metadata: &Map<String, Value>) -> bool {
    match metadata.get("selected").and_then(Value::as_bool) {
        Some(selected) => selected,
        None => metadata
            .get("selected-by-default")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
