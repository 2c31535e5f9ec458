//! Error types for loading and validating manifests.
//!
//! Loading failures ([`LoadError`]) happen before validation starts.
//! Validation failures ([`ValidationError`]) come in two kinds: the fatal
//! version errors that stop a run immediately, and [`ValidationError::Invalid`]
//! which carries every accumulated finding at once.

use thiserror::Error;

use crate::report::ErrorReport;

/// Failures while reading or parsing a manifest file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file holds no YAML document.
    #[error("empty YAML file")]
    Empty,

    /// The document root is a scalar or a sequence.
    #[error("the config root must be a mapping of field names to values")]
    NotAMapping,
}

/// Outcome of a failed validation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `biolib_version` is absent.
    #[error("Your config file is missing the biolib_version field.")]
    MissingVersion,

    /// `biolib_version` is present but not the supported value.
    #[error(
        "BioLib version must be 2. Please update \".biolib/config.yml\" to \"biolib_version: 2\""
    )]
    UnsupportedVersion {
        /// The value found in the document, rendered as text.
        found: String,
    },

    /// One or more rules were violated.
    #[error("config validation failed with {} finding(s)", .0.message_count())]
    Invalid(ErrorReport),
}

impl ValidationError {
    /// Returns `true` for the errors that abort a run before any rule is
    /// checked.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingVersion | Self::UnsupportedVersion { .. })
    }

    /// Returns the accumulated findings, if any.
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Invalid(report) => Some(report),
            _ => None,
        }
    }

    /// Converts the error into the report shape presented to users.
    ///
    /// Fatal errors become a single message under the root section.
    pub fn to_report(&self) -> ErrorReport {
        match self {
            Self::Invalid(report) => report.clone(),
            fatal => ErrorReport::fatal(fatal.to_string()),
        }
    }
}

/// Convenience alias for results with [`LoadError`].
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_render_as_root_messages() {
        let report = ValidationError::MissingVersion.to_report();
        assert_eq!(
            report.find(&["config_yml"]).and_then(|f| f.messages()),
            Some(&["Your config file is missing the biolib_version field.".to_string()][..])
        );
        assert!(ValidationError::MissingVersion.is_fatal());
        assert!(ValidationError::MissingVersion.report().is_none());
    }

    #[test]
    fn test_invalid_is_not_fatal() {
        let err = ValidationError::Invalid(ErrorReport::fatal("x"));
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "config validation failed with 1 finding(s)");
    }
}
