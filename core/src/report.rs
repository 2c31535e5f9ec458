//! Hierarchical error report produced by a validation run.
//!
//! The report is a tree: the root is keyed by section (always
//! [`ROOT_SECTION`] today), sections are keyed by field, module or argument
//! name, and leaves are ordered lists of human-readable messages. Maps keep
//! insertion order so that repeated runs over the same document render
//! byte-identical output.
//!
//! # Examples
//!
//! ```
//! use biolib_config_core::{ErrorReport, Finding, FindingMap};
//!
//! let mut section = FindingMap::new();
//! section.set_message("output_type", "bad output type");
//!
//! let report = ErrorReport::from_section(section);
//! assert!(!report.is_empty());
//! assert_eq!(report.message_count(), 1);
//! assert_eq!(
//!     report.find(&["config_yml", "output_type"]).and_then(Finding::messages),
//!     Some(&["bad output type".to_string()][..]),
//! );
//! ```

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// Name of the section every finding is reported under.
pub const ROOT_SECTION: &str = "config_yml";

/// One node of the report tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Finding {
    /// Ordered messages about a single field or identifier.
    Messages(Vec<String>),
    /// A nested scope keyed by field, module or argument name.
    Nested(FindingMap),
}

impl Finding {
    /// Creates a leaf holding a single message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Messages(vec![message.into()])
    }

    /// Returns the messages when this node is a leaf.
    pub fn messages(&self) -> Option<&[String]> {
        match self {
            Self::Messages(messages) => Some(messages),
            Self::Nested(_) => None,
        }
    }

    /// Returns the nested map when this node is a scope.
    pub fn as_map(&self) -> Option<&FindingMap> {
        match self {
            Self::Messages(_) => None,
            Self::Nested(map) => Some(map),
        }
    }

    /// Returns `true` if no message exists anywhere below this node.
    pub fn is_empty(&self) -> bool {
        self.message_count() == 0
    }

    /// Total number of messages below this node.
    pub fn message_count(&self) -> usize {
        match self {
            Self::Messages(messages) => messages.len(),
            Self::Nested(map) => map.message_count(),
        }
    }
}

/// Insertion-ordered map of findings.
///
/// Setting a key that already exists replaces its value in place, keeping
/// the key's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindingMap {
    entries: Vec<(String, Finding)>,
}

impl FindingMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&Finding> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, finding)| finding)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Finding> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, finding)| finding)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Finding)> {
        self.entries
            .iter()
            .map(|(name, finding)| (name.as_str(), finding))
    }

    /// Sets `key` to `finding`, replacing any previous value.
    ///
    /// Empty findings are ignored so that callers never have to guard
    /// against recording a scope without messages.
    pub fn set(&mut self, key: impl Into<String>, finding: Finding) {
        if finding.is_empty() {
            return;
        }
        let key = key.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = finding,
            None => self.entries.push((key, finding)),
        }
    }

    /// Sets `key` to a single-message leaf.
    pub fn set_message(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.set(key, Finding::message(message));
    }

    /// Sets `key` to a list of messages.
    pub fn set_messages(&mut self, key: impl Into<String>, messages: Vec<String>) {
        self.set(key, Finding::Messages(messages));
    }

    /// Sets `key` to a nested scope.
    pub fn set_nested(&mut self, key: impl Into<String>, map: FindingMap) {
        self.set(key, Finding::Nested(map));
    }

    /// Copies every entry of `other` into `self`, later keys replacing
    /// earlier ones.
    pub fn merge(&mut self, other: FindingMap) {
        for (key, finding) in other.entries {
            self.set(key, finding);
        }
    }

    /// Total number of messages in the map, recursively.
    pub fn message_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, finding)| finding.message_count())
            .sum()
    }
}

impl Serialize for FindingMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, finding) in &self.entries {
            map.serialize_entry(key, finding)?;
        }
        map.end()
    }
}

/// The full report of one validation run.
///
/// An empty report means the document is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorReport {
    sections: FindingMap,
}

impl ErrorReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the findings of the [`ROOT_SECTION`].
    pub fn from_section(section: FindingMap) -> Self {
        let mut sections = FindingMap::new();
        sections.set_nested(ROOT_SECTION, section);
        Self { sections }
    }

    /// Builds a report carrying one message directly under the
    /// [`ROOT_SECTION`], the shape fatal errors are presented in.
    pub fn fatal(message: impl Into<String>) -> Self {
        let mut sections = FindingMap::new();
        sections.set_message(ROOT_SECTION, message);
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Top-level sections in insertion order.
    pub fn sections(&self) -> &FindingMap {
        &self.sections
    }

    /// Follows `path` from the root, returning the node it names.
    pub fn find(&self, path: &[&str]) -> Option<&Finding> {
        let (first, rest) = path.split_first()?;
        let mut node = self.sections.get(first)?;
        for segment in rest {
            node = node.as_map()?.get(segment)?;
        }
        Some(node)
    }

    /// Total number of messages in the report.
    pub fn message_count(&self) -> usize {
        self.sections.message_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut map = FindingMap::new();
        map.set_message("a", "first");
        map.set_message("b", "second");
        map.set_message("a", "replaced");

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            map.get("a").and_then(Finding::messages),
            Some(&["replaced".to_string()][..])
        );
    }

    #[test]
    fn test_empty_findings_are_not_recorded() {
        let mut map = FindingMap::new();
        map.set_messages("a", Vec::new());
        map.set_nested("b", FindingMap::new());
        assert!(map.is_empty());
    }

    #[test]
    fn test_report_serializes_in_insertion_order() {
        let mut module = FindingMap::new();
        module.set_message("image", "missing image");
        let mut modules = FindingMap::new();
        modules.set_nested("main", module);

        let mut section = FindingMap::new();
        section.set_message("output_type", "bad");
        section.set_nested("modules", modules);

        let json = serde_json::to_string(&ErrorReport::from_section(section)).unwrap();
        assert_eq!(
            json,
            r#"{"config_yml":{"output_type":["bad"],"modules":{"main":{"image":["missing image"]}}}}"#
        );
    }

    #[test]
    fn test_fatal_report_shape() {
        let report = ErrorReport::fatal("boom");
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"config_yml":["boom"]}"#);
        assert_eq!(report.message_count(), 1);
    }

    #[test]
    fn test_find_walks_nested_scopes() {
        let mut inner = FindingMap::new();
        inner.set_message("gpu", "bad gpu");
        let mut section = FindingMap::new();
        section.set_nested("modules", {
            let mut modules = FindingMap::new();
            modules.set_nested("main", inner);
            modules
        });
        let report = ErrorReport::from_section(section);

        assert!(report.find(&["config_yml", "modules", "main", "gpu"]).is_some());
        assert!(report.find(&["config_yml", "modules", "other"]).is_none());
        assert!(report.find(&[]).is_none());
    }
}
