use crate::constants::DATE_FORMAT;
use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Singer state: `{"bookmarks": {"<stream>": {...}}}`.
///
/// Anything else found in the input state is carried over unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    value: Value,
}

impl Default for State {
    fn default() -> Self {
        Self {
            value: json!({"bookmarks": {}}),
        }
    }
}

impl State {
    /// Loads a state file. An empty file is treated as an empty state.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read and `JsonError` if it does not
    /// contain a JSON object.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("Failed to read state {}: {e}", path.display()))
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_value(serde_json::from_str(&contents)?)
    }

    pub fn from_value(value: Value) -> AppResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(AppError::JsonError(
                "State must be a JSON object".into(),
            ));
        };
        match map.get("bookmarks") {
            Some(Value::Object(_)) => {}
            None | Some(Value::Null) => {
                map.insert("bookmarks".into(), Value::Object(Map::new()));
            }
            Some(_) => {
                return Err(AppError::JsonError(
                    "State bookmarks must be a JSON object".into(),
                ))
            }
        }
        Ok(Self {
            value: Value::Object(map),
        })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Bookmark object of `stream`, if any.
    pub fn bookmark(&self, stream: &str) -> Option<&Map<String, Value>> {
        self.value["bookmarks"].get(stream)?.as_object()
    }

    /// The `end_date` recorded by the last sync of `stream`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the bookmark is not a `YYYY-MM-DD` string.
    pub fn end_date(&self, stream: &str) -> AppResult<Option<NaiveDate>> {
        let Some(raw) = self.bookmark(stream).and_then(|b| b.get("end_date")) else {
            return Ok(None);
        };
        match raw {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(NaiveDate::parse_from_str(s, DATE_FORMAT)?)),
            other => Err(AppError::InvalidInput(format!(
                "Bookmark end_date of {stream} must be a date string, got {other}"
            ))),
        }
    }

    /// Records `end_date` in the bookmark of `stream`, keeping its other keys.
    pub fn set_end_date(&mut self, stream: &str, end_date: NaiveDate) {
        let date = Value::String(end_date.format(DATE_FORMAT).to_string());
        if let Some(bookmarks) = self.value["bookmarks"].as_object_mut() {
            let bookmark = bookmarks
                .entry(stream.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match bookmark.as_object_mut() {
                Some(existing) => {
                    existing.insert("end_date".into(), date);
                }
                None => *bookmark = json!({ "end_date": date }),
            }
        }
    }
}
