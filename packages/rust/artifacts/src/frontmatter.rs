//! YAML front matter blocks for generated pod pages.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use samplebuilder_shared::{Result, SampleBuilderError};

/// Ordered YAML mapping builder; keys are emitted in insertion order.
#[derive(Debug, Default)]
pub(crate) struct Header {
    map: Mapping,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn str(mut self, key: &str, value: impl Into<String>) -> Self {
        self.map
            .insert(Value::String(key.into()), Value::String(value.into()));
        self
    }

    pub fn bool(mut self, key: &str, value: bool) -> Self {
        self.map.insert(Value::String(key.into()), Value::Bool(value));
        self
    }

    pub fn nested(mut self, key: &str, value: Header) -> Self {
        self.map
            .insert(Value::String(key.into()), Value::Mapping(value.map));
        self
    }

    /// Insert any serializable value.
    pub fn value<T: Serialize>(mut self, key: &str, value: &T) -> Result<Self> {
        let value = serde_yaml::to_value(value)
            .map_err(|e| SampleBuilderError::Render(format!("front matter field {key}: {e}")))?;
        self.map.insert(Value::String(key.into()), value);
        Ok(self)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.map)
            .map(|yaml| yaml.trim_end().to_string())
            .map_err(|e| SampleBuilderError::Render(format!("front matter: {e}")))
    }
}

/// Reference to the co-located data file. Written by hand because the tag
/// must not be quoted.
pub(crate) fn data_reference(pod_path: &str, stem: &str) -> String {
    format!("example: !g.json {}/{stem}.json", pod_path.trim_end_matches('/'))
}

/// Wrap YAML chunks into a `---` delimited front matter document.
pub(crate) fn document(chunks: &[String]) -> String {
    format!("---\n{}\n---\n", chunks.join("\n"))
}
