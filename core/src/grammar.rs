//! Micro-grammars for string-encoded manifest fields.
//!
//! Each grammar is strict: a value either parses into a typed view
//! borrowing from the input, or fails with the first rule it breaks.
//! The user-facing wording of a failure is chosen by the validator that
//! owns the field, since it knows the module and field names involved.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::catalog::{self, Environment, Executor};

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Why a module or argument identifier was rejected.
///
/// The `Display` text completes the sentence
/// "The module name X is invalid, ...".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("it can only contain alphanumeric characters.")]
    InvalidCharacters,
    #[error("it can not contain consecutive dashes or underscores")]
    ConsecutiveSeparators,
    #[error("it can not start with dashes or underscores")]
    LeadingSeparator,
    #[error("it can not end with dashes or underscores")]
    TrailingSeparator,
}

fn is_separator(ch: char) -> bool {
    matches!(ch, '-' | '_')
}

/// Validates an identifier; rules are checked in order and the first
/// failure wins.
///
/// # Examples
///
/// ```
/// use biolib_config_core::grammar::{NameError, validate_name};
///
/// assert_eq!(validate_name("step-1"), Ok("step-1"));
/// assert_eq!(validate_name("step 1"), Err(NameError::InvalidCharacters));
/// assert_eq!(validate_name("a_-b"), Err(NameError::ConsecutiveSeparators));
/// assert_eq!(validate_name("_a"), Err(NameError::LeadingSeparator));
/// assert_eq!(validate_name("a-"), Err(NameError::TrailingSeparator));
/// ```
pub fn validate_name(name: &str) -> Result<&str, NameError> {
    if name.is_empty()
        || !name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || is_separator(ch))
    {
        return Err(NameError::InvalidCharacters);
    }

    let bytes = name.as_bytes();
    if bytes
        .windows(2)
        .any(|pair| is_separator(pair[0] as char) && is_separator(pair[1] as char))
    {
        return Err(NameError::ConsecutiveSeparators);
    }

    if name.starts_with(is_separator) {
        return Err(NameError::LeadingSeparator);
    }

    if name.ends_with(is_separator) {
        return Err(NameError::TrailingSeparator);
    }

    Ok(name)
}

// ---------------------------------------------------------------------------
// File mappings
// ---------------------------------------------------------------------------

static POSITIONAL_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[1-9][0-9]*").expect("static regex must compile"));
static NUMERIC_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[0-9]+").expect("static regex must compile"));

/// A parsed `COPY <from> <to>` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMapping<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

/// Why a file-mapping directive was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The directive is not exactly three space-separated tokens.
    #[error("expected exactly three space-separated tokens")]
    WrongArity,
    /// The first token is not `COPY`.
    #[error("directive does not start with COPY")]
    MissingCopy,
    /// A `$` that is not part of a `$N` positional token.
    #[error("path {path} uses an invalid variable")]
    InvalidVariable { path: String },
    /// A directory source mapped to a file destination.
    #[error("directory source mapped to a non-directory destination")]
    DirectoryToFile,
    /// A path that is neither absolute nor a variable.
    #[error("path {path} is not absolute")]
    RelativePath { path: String },
    /// A path containing `//`.
    #[error("path contains consecutive slashes")]
    ConsecutiveSlashes,
}

fn has_invalid_variable(path: &str) -> bool {
    POSITIONAL_VARIABLE.replace_all(path, "").contains('$')
}

fn is_absolute_or_variable(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('$')
}

impl<'a> FileMapping<'a> {
    /// Parses a mapping directive.
    ///
    /// # Examples
    ///
    /// ```
    /// use biolib_config_core::grammar::{FileMapping, MappingError};
    ///
    /// let mapping = FileMapping::parse("COPY /a/ /b/").unwrap();
    /// assert_eq!((mapping.from, mapping.to), ("/a/", "/b/"));
    /// assert!(FileMapping::parse("COPY /a $1").is_ok());
    /// assert_eq!(
    ///     FileMapping::parse("COPY /a/ /b"),
    ///     Err(MappingError::DirectoryToFile)
    /// );
    /// ```
    pub fn parse(directive: &'a str) -> Result<Self, MappingError> {
        let parts: Vec<&str> = directive.split(' ').collect();
        let [command, from, to] = parts[..] else {
            return Err(MappingError::WrongArity);
        };
        if command != "COPY" {
            return Err(MappingError::MissingCopy);
        }

        for path in [from, to] {
            if has_invalid_variable(path) {
                return Err(MappingError::InvalidVariable {
                    path: path.to_string(),
                });
            }
        }

        let to_with_bare_variables = NUMERIC_VARIABLE.replace_all(to, "$");
        if from.ends_with('/') && !to.ends_with('/') && !to_with_bare_variables.ends_with('$') {
            return Err(MappingError::DirectoryToFile);
        }

        for path in [to, from] {
            if !is_absolute_or_variable(path) {
                return Err(MappingError::RelativePath {
                    path: path.to_string(),
                });
            }
        }

        if from.contains("//") || to.contains("//") {
            return Err(MappingError::ConsecutiveSlashes);
        }

        Ok(Self { from, to })
    }

    /// Returns `true` if the source is a directory.
    pub fn is_directory(&self) -> bool {
        self.from.ends_with('/')
    }
}

// ---------------------------------------------------------------------------
// Executor specifiers
// ---------------------------------------------------------------------------

/// A `<executor>:<version>` pair resolved against the executor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSpec<'a> {
    pub executor: &'static Executor,
    pub version: &'a str,
}

/// Why an executor specifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// Not exactly one `:` separating name and version.
    #[error("expected exactly one ':' between executor name and version")]
    MissingSeparator,
    /// The executor name is not in the table.
    #[error("unknown executor {name}")]
    UnknownExecutor { name: String },
    /// The executor exists but does not ship the version.
    #[error("executor {} does not support version {version}", .executor.name)]
    UnsupportedVersion {
        executor: &'static Executor,
        version: String,
    },
}

impl<'a> ExecutorSpec<'a> {
    /// Parses a specifier, resolving the name with `lookup`.
    fn parse_with(
        spec: &'a str,
        lookup: fn(&str) -> Option<&'static Executor>,
    ) -> Result<Self, ExecutorError> {
        let Some((name, version)) = spec.split_once(':') else {
            return Err(ExecutorError::MissingSeparator);
        };
        if version.contains(':') {
            return Err(ExecutorError::MissingSeparator);
        }

        let executor = lookup(name).ok_or_else(|| ExecutorError::UnknownExecutor {
            name: name.to_string(),
        })?;
        if !executor.supports(version) {
            return Err(ExecutorError::UnsupportedVersion {
                executor,
                version: version.to_string(),
            });
        }

        Ok(Self { executor, version })
    }

    /// Parses a managed executor reference (`python:3.9`).
    pub fn parse(spec: &'a str) -> Result<Self, ExecutorError> {
        Self::parse_with(spec, catalog::executor)
    }

    /// Parses a legacy `executor` field, accepting legacy executor names.
    ///
    /// # Examples
    ///
    /// ```
    /// use biolib_config_core::grammar::{ExecutorError, ExecutorSpec};
    ///
    /// let spec = ExecutorSpec::parse_legacy("python:*").unwrap();
    /// assert_eq!(spec.executor.name, "python");
    /// assert_eq!(
    ///     ExecutorSpec::parse_legacy("python"),
    ///     Err(ExecutorError::MissingSeparator)
    /// );
    /// ```
    pub fn parse_legacy(spec: &'a str) -> Result<Self, ExecutorError> {
        Self::parse_with(spec, catalog::legacy_executor)
    }
}

// ---------------------------------------------------------------------------
// Image URIs
// ---------------------------------------------------------------------------

/// A parsed `<environment>://<reference>` image URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageUri<'a> {
    pub environment: Environment,
    /// Everything after `://`.
    pub reference: &'a str,
    /// Set when the reference names a platform-managed executor image.
    pub managed: Option<ExecutorSpec<'a>>,
}

/// Why an image URI was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// No `://` separator.
    #[error("image has no environment scheme")]
    MissingScheme,
    /// The scheme is not a known environment.
    #[error("unknown image environment {scheme}")]
    UnknownEnvironment { scheme: String },
    /// A managed image reference that failed the executor grammar.
    #[error("invalid managed image: {0}")]
    Managed(#[from] ExecutorError),
}

impl<'a> ImageUri<'a> {
    /// Parses an image URI.
    ///
    /// # Examples
    ///
    /// ```
    /// use biolib_config_core::catalog::Environment;
    /// use biolib_config_core::grammar::{ImageError, ImageUri};
    ///
    /// let image = ImageUri::parse("biolib-app://biolib/python:3.9").unwrap();
    /// assert_eq!(image.environment, Environment::BiolibApp);
    /// assert_eq!(image.managed.map(|spec| spec.version), Some("3.9"));
    ///
    /// assert!(ImageUri::parse("dockerhub://ubuntu:22.04").unwrap().managed.is_none());
    /// assert_eq!(ImageUri::parse("ubuntu"), Err(ImageError::MissingScheme));
    /// ```
    pub fn parse(image: &'a str) -> Result<Self, ImageError> {
        let Some((scheme, reference)) = image.split_once("://") else {
            return Err(ImageError::MissingScheme);
        };
        let environment =
            Environment::from_scheme(scheme).ok_or_else(|| ImageError::UnknownEnvironment {
                scheme: scheme.to_string(),
            })?;

        let managed = match (
            environment,
            reference.strip_prefix(catalog::MANAGED_IMAGE_NAMESPACE),
        ) {
            (Environment::BiolibApp, Some(spec)) => Some(ExecutorSpec::parse(spec)?),
            _ => None,
        };

        Ok(Self {
            environment,
            reference,
            managed,
        })
    }
}
