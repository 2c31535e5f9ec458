//! Validation orchestration.
//!
//! A run checks the manifest version first; that is the only check that
//! fails immediately. Document-level fields, modules and arguments are then
//! validated independently and their findings merged under the
//! [`ROOT_SECTION`](crate::ROOT_SECTION) of one [`ErrorReport`].
//!
//! # Examples
//!
//! ```
//! use biolib_config_core::{Document, ValidationError, validate_document};
//!
//! let doc = Document::parse("biolib_version: 2\noutput_type: pdf\n").unwrap();
//! let Err(ValidationError::Invalid(report)) = validate_document(&doc) else {
//!     panic!("expected findings");
//! };
//! assert!(report.find(&["config_yml", "output_type"]).is_some());
//!
//! let doc = Document::parse("output_type: text\n").unwrap();
//! assert_eq!(validate_document(&doc), Err(ValidationError::MissingVersion));
//! ```

use crate::argument::validate_arguments;
use crate::document::{Document, key_name};
use crate::error::ValidationError;
use crate::fields::validate_document_fields;
use crate::report::{ErrorReport, FindingMap};
use crate::task::{Dialect, validate_tasks};

/// Checks `biolib_version` and returns the task dialect it selects.
///
/// # Errors
///
/// Returns [`ValidationError::MissingVersion`] if the field is absent and
/// [`ValidationError::UnsupportedVersion`] for any value other than the
/// supported integer.
pub fn validate_version(doc: &Document) -> Result<Dialect, ValidationError> {
    let value = doc
        .get("biolib_version")
        .ok_or(ValidationError::MissingVersion)?;
    value
        .as_i64()
        .filter(|version| *version == crate::catalog::SUPPORTED_BIOLIB_VERSION)
        .and_then(Dialect::for_version)
        .ok_or_else(|| ValidationError::UnsupportedVersion {
            found: key_name(value),
        })
}

/// Runs every accumulated check for `dialect` and returns the findings.
///
/// This never fails: an empty report means the document is valid. The
/// version gate is not applied, which lets callers validate a document
/// against a dialect of their choosing.
pub fn collect_findings(doc: &Document, dialect: Dialect) -> ErrorReport {
    let mut section = FindingMap::new();
    section.merge(validate_document_fields(doc));
    section.set("modules", validate_tasks(doc, dialect));
    section.set("arguments", validate_arguments(doc));

    if section.is_empty() {
        return ErrorReport::new();
    }
    ErrorReport::from_section(section)
}

/// Validates a manifest.
///
/// # Errors
///
/// Returns the fatal version errors of [`validate_version`] before any
/// other rule runs, or [`ValidationError::Invalid`] carrying every finding.
pub fn validate_document(doc: &Document) -> Result<(), ValidationError> {
    let dialect = validate_version(doc)?;
    let report = collect_findings(doc, dialect);

    tracing::info!(
        ?dialect,
        findings = report.message_count(),
        "Validated config"
    );
    if report.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Invalid(report))
    }
}
