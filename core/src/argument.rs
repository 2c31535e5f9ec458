//! Per-argument validation.
//!
//! Findings for an argument are keyed by its `key`. An entry without a key
//! cannot be indexed, so it produces one generic finding and nothing else
//! about it is checked.

use std::collections::HashSet;

use serde_yaml::{Mapping, Value};

use crate::catalog::{self, ARGUMENT_FIELDS, HIDDEN_RENDER_TYPE, RENDER_TYPES, TOGGLE_RENDER_TYPE};
use crate::document::{Document, is_truthy, key_name};
use crate::report::{Finding, FindingMap};

/// Scope that collects findings about argument entries without a key.
pub const MISSING_KEY_SCOPE: &str = "required";

const MISSING_KEY_MESSAGE: &str =
    "One of your arguments is missing a key. Please specify a key for each of your arguments";

const TOGGLE_OPTIONS: [&str; 2] = ["on", "off"];

/// Result of validating one argument entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentReport {
    /// The entry has no `key`; nothing else was checked.
    MissingKey,
    /// Findings for a keyed entry, empty when the entry is valid.
    Keyed { key: String, findings: FindingMap },
}

/// Validates the `arguments` section.
///
/// Returns an empty finding when every argument is valid or the section is
/// absent.
pub fn validate_arguments(doc: &Document) -> Finding {
    let Some(value) = doc.get("arguments") else {
        return Finding::Nested(FindingMap::new());
    };
    let Some(arguments) = value.as_sequence() else {
        return Finding::message(
            "The arguments field is invalid. Please define arguments as a YAML list",
        );
    };

    let mut findings = FindingMap::new();
    let mut seen_keys = HashSet::new();
    for entry in arguments {
        match validate_argument(entry) {
            ArgumentReport::MissingKey => match findings.get_mut(MISSING_KEY_SCOPE) {
                // An argument is actually keyed like the scope; keep its findings.
                Some(Finding::Nested(argument)) => {
                    argument.set_message("missing_key", MISSING_KEY_MESSAGE);
                }
                _ => findings.set_message(MISSING_KEY_SCOPE, MISSING_KEY_MESSAGE),
            },
            ArgumentReport::Keyed {
                key,
                findings: mut argument,
            } => {
                if key == MISSING_KEY_SCOPE
                    && matches!(findings.get(MISSING_KEY_SCOPE), Some(Finding::Messages(_)))
                {
                    argument.set_message("missing_key", MISSING_KEY_MESSAGE);
                }
                if !seen_keys.insert(key.clone()) {
                    argument.set_message(
                        "duplicate_key",
                        format!("The argument key {key} is used by more than one argument"),
                    );
                }
                findings.set_nested(key, argument);
            }
        }
    }
    Finding::Nested(findings)
}

/// Validates one argument entry.
///
/// # Examples
///
/// ```
/// use biolib_config_core::argument::{ArgumentReport, validate_argument};
///
/// let entry: serde_yaml::Value =
///     serde_yaml::from_str("{key: --in, type: text, description: Input}").unwrap();
/// match validate_argument(&entry) {
///     ArgumentReport::Keyed { key, findings } => {
///         assert_eq!(key, "--in");
///         assert!(findings.is_empty());
///     }
///     ArgumentReport::MissingKey => unreachable!(),
/// }
/// ```
pub fn validate_argument(entry: &Value) -> ArgumentReport {
    let Some(argument) = entry.as_mapping() else {
        return ArgumentReport::MissingKey;
    };
    let Some(key) = argument
        .get("key")
        .filter(|key| !key.is_null())
        .map(key_name)
    else {
        return ArgumentReport::MissingKey;
    };

    let mut findings = FindingMap::new();
    check_unsupported_fields(&key, argument, &mut findings);
    check_sub_and_group_arguments(argument, &mut findings);
    check_required(&key, argument, &mut findings);
    if let Some(render_type) = check_type(&key, argument, &mut findings) {
        check_description(&key, argument, render_type, &mut findings);
    }

    tracing::debug!(
        argument = %key,
        findings = findings.message_count(),
        "Validated argument"
    );
    ArgumentReport::Keyed { key, findings }
}

fn check_unsupported_fields(key: &str, argument: &Mapping, findings: &mut FindingMap) {
    let errors = argument
        .keys()
        .map(key_name)
        .filter(|field| !ARGUMENT_FIELDS.contains(&field.as_str()))
        .map(|field| format!("The argument field {field} on {key} is not valid"))
        .collect();
    findings.set_messages("unsupported_fields", errors);
}

fn check_sub_and_group_arguments(argument: &Mapping, findings: &mut FindingMap) {
    let present = |field: &str| argument.get(field).is_some_and(is_truthy);
    if present("sub_arguments") && present("group_arguments") {
        findings.set_message(
            "sub_arguments",
            "Only one of `sub_arguments` or `group_arguments` can be specified",
        );
    }
}

fn check_required(key: &str, argument: &Mapping, findings: &mut FindingMap) {
    if argument
        .get("required")
        .is_some_and(|value| !value.is_bool())
    {
        findings.set_message(
            "required",
            format!(
                "Invalid value in required specified on {key} argument. required can be true or false"
            ),
        );
    }
}

/// Checks `type`, returning it when present and valid.
///
/// A missing type is reported, and like an invalid one it skips the
/// description check.
/// A toggle whose options are wrong is reported here and treated as
/// invalid, which stops the remaining checks for the argument.
fn check_type<'a>(key: &str, argument: &'a Mapping, findings: &mut FindingMap) -> Option<&'a str> {
    let Some(value) = argument.get("type") else {
        findings.set_message(
            "type",
            format!(
                "Missing type on argument {key}. type can be one of {}",
                catalog::format_choices(RENDER_TYPES)
            ),
        );
        return None;
    };
    let render_type = value.as_str().filter(|t| RENDER_TYPES.contains(t));
    let Some(render_type) = render_type else {
        findings.set_message(
            "type",
            format!(
                "Invalid value {} in type specified on {key} argument type can be one of {}",
                key_name(value),
                catalog::format_choices(RENDER_TYPES)
            ),
        );
        return None;
    };

    if render_type == TOGGLE_RENDER_TYPE {
        if let Err(message) = check_toggle_options(argument) {
            findings.set_message("type", message);
            return None;
        }
    }
    Some(render_type)
}

fn check_toggle_options(argument: &Mapping) -> Result<(), String> {
    const EXPECTED: &str =
        "There must be exactly 2 options (\"on\" and \"off\") on arguments of type toggle";

    let Some(options) = argument.get("options").and_then(Value::as_mapping) else {
        return Err(EXPECTED.to_string());
    };
    if options.len() != TOGGLE_OPTIONS.len() {
        return Err(format!("{EXPECTED}. Received {} options", options.len()));
    }

    let names: Vec<String> = options.keys().map(key_name).collect();
    let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut expected = TOGGLE_OPTIONS;
    expected.sort_unstable();
    if sorted != expected {
        return Err(format!(
            "The two options on arguments of type toggle must be named \"on\" and \"off\". Received {}",
            names.join(", ")
        ));
    }
    Ok(())
}

fn check_description(key: &str, argument: &Mapping, render_type: &str, findings: &mut FindingMap) {
    if render_type != HIDDEN_RENDER_TYPE && !argument.contains_key("description") {
        findings.set_message(
            "argument_description",
            format!(
                "Could not find a description for argument {key}. Please provide a description for {key}"
            ),
        );
    }
}
