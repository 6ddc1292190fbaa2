// Lesson document module - the JSON object exactly as authored on disk.
// Key order and unknown keys survive a rewrite; malformed shapes are kept
// for the passes to repair or report.

use color_eyre::{eyre::WrapErr, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::SampleSource;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonDoc {
    root: Map<String, Value>,
}

impl LessonDoc {
    /// Parse a whole lesson file. Fails on malformed JSON or a non-object root.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// The lesson id, if present as a non-empty string.
    pub fn id(&self) -> Option<&str> {
        self.root
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.root.get_mut(key)
    }

    pub fn root_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Two-space indented JSON with a trailing newline.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut text =
            serde_json::to_string_pretty(&self.root).wrap_err("failed to encode lesson")?;
        text.push('\n');
        Ok(text)
    }

    /// Typed view of just `schema` and `sample_data`.
    pub fn sample_source(&self) -> Result<SampleSource> {
        let mut sections = Map::new();
        for key in [crate::names::SCHEMA, crate::names::SAMPLE_DATA] {
            if let Some(value) = self.root.get(key) {
                sections.insert(key.to_owned(), value.clone());
            }
        }
        SampleSource::deserialize(&Value::Object(sections))
            .wrap_err("schema or sample_data is malformed")
    }
}
