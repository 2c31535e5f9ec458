//! The parsed manifest handed to the validator.
//!
//! A [`Document`] is an immutable view over a YAML mapping. Loading from
//! text or disk lives here too, so validators only ever see a tree that is
//! known to have a mapping at its root.
//!
//! # Examples
//!
//! ```
//! use biolib_config_core::Document;
//!
//! let doc = Document::parse("biolib_version: 2\noutput_type: text\n").unwrap();
//! assert!(doc.contains("output_type"));
//! assert_eq!(doc.get("output_type").and_then(|v| v.as_str()), Some("text"));
//! ```

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{LoadError, Result};

/// A manifest whose root is a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Mapping,
}

impl Document {
    /// Wraps an already-parsed mapping.
    pub fn from_mapping(root: Mapping) -> Self {
        Self { root }
    }

    /// Wraps a parsed YAML value.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Empty`] for a null document and
    /// [`LoadError::NotAMapping`] for any other non-mapping root.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Err(LoadError::Empty),
            Value::Mapping(root) => Ok(Self { root }),
            _ => Err(LoadError::NotAMapping),
        }
    }

    /// Parses YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Yaml`] for malformed text, plus the errors of
    /// [`Document::from_value`].
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(LoadError::Empty);
        }
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(value)
    }

    /// Reads and parses a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read, plus the errors
    /// of [`Document::parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading config");
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// The root mapping.
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Top-level keys rendered as text, in document order.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.root.keys().map(key_name)
    }
}

/// Renders a mapping key or scalar as the text users wrote.
pub(crate) fn key_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Tagged(tagged) => key_name(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// YAML truthiness: null, `false`, zero, and empty strings or collections
/// are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}
