//! Per-module validation.
//!
//! Every module name first goes through the name grammar; only modules with
//! a valid name have their body checked. The body rules depend on the
//! [`Dialect`] selected by the manifest version, and the two dialects are
//! validated by separate functions that share only the working-directory
//! and unsupported-field checks.

use serde_yaml::{Mapping, Value};

use crate::catalog::{
    self, CURRENT_TASK_FIELDS, DEPRECATED_TASK_FIELDS, EXECUTORS, Environment, GpuPreference,
    LEGACY_TASK_FIELDS, TASK_BASE_FIELDS,
};
use crate::document::{Document, key_name};
use crate::grammar::{
    ExecutorError, ExecutorSpec, FileMapping, ImageError, ImageUri, MappingError, validate_name,
};
use crate::report::{Finding, FindingMap};

/// Task schema variant, selected by `biolib_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `executor` + `path` modules, or a bare string shorthand.
    Legacy,
    /// Image-based modules with file mappings and machine settings.
    Current,
}

impl Dialect {
    /// Maps a manifest version to its dialect.
    pub fn for_version(version: i64) -> Option<Self> {
        match version {
            catalog::LEGACY_BIOLIB_VERSION => Some(Self::Legacy),
            catalog::SUPPORTED_BIOLIB_VERSION => Some(Self::Current),
            _ => None,
        }
    }

    /// The manifest version this dialect belongs to.
    pub fn version(self) -> i64 {
        match self {
            Self::Legacy => catalog::LEGACY_BIOLIB_VERSION,
            Self::Current => catalog::SUPPORTED_BIOLIB_VERSION,
        }
    }

    fn accepts_field(self, field: &str) -> bool {
        let dialect_fields = match self {
            Self::Legacy => LEGACY_TASK_FIELDS,
            Self::Current => CURRENT_TASK_FIELDS,
        };
        TASK_BASE_FIELDS.contains(&field) || dialect_fields.contains(&field)
    }
}

/// The three file-mapping lists of a current-dialect module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    InputFiles,
    OutputFiles,
    SourceFiles,
}

impl MappingKind {
    pub const ALL: [MappingKind; 3] = [
        MappingKind::InputFiles,
        MappingKind::OutputFiles,
        MappingKind::SourceFiles,
    ];

    /// Field name of the list in a module.
    pub fn field(self) -> &'static str {
        match self {
            Self::InputFiles => "input_files",
            Self::OutputFiles => "output_files",
            Self::SourceFiles => "source_files",
        }
    }
}

/// Validates the `modules` section.
///
/// Returns an empty finding when every module is valid or the section is
/// absent. Modules without findings are left out.
pub fn validate_tasks(doc: &Document, dialect: Dialect) -> Finding {
    let Some(value) = doc.get("modules") else {
        return Finding::Nested(FindingMap::new());
    };
    let Some(modules) = value.as_mapping() else {
        return Finding::message(
            "The modules field is invalid. Please define modules as a YAML dict of module names to module definitions",
        );
    };

    let mut findings = FindingMap::new();
    for (name, body) in modules {
        let name = key_name(name);
        if let Some(finding) = validate_task(&name, body, dialect) {
            findings.set(name, finding);
        }
    }
    Finding::Nested(findings)
}

/// Validates one module, returning `None` when it has no findings.
///
/// An invalid name yields a single message and the body is not inspected.
pub fn validate_task(name: &str, body: &Value, dialect: Dialect) -> Option<Finding> {
    let name = match validate_name(name) {
        Ok(name) => name,
        Err(err) => {
            tracing::debug!(module = name, error = %err, "Rejected module name");
            return Some(Finding::message(format!(
                "The module name {name} is invalid, {err}"
            )));
        }
    };

    let mut findings = FindingMap::new();
    match dialect {
        Dialect::Legacy => validate_legacy_task(name, body, &mut findings),
        Dialect::Current => validate_current_task(name, body, &mut findings),
    }

    tracing::debug!(
        module = name,
        ?dialect,
        findings = findings.message_count(),
        "Validated module"
    );
    (!findings.is_empty()).then_some(Finding::Nested(findings))
}

fn validate_legacy_task(name: &str, body: &Value, findings: &mut FindingMap) {
    let task = match body {
        // Shorthand reference to a module defined elsewhere.
        Value::String(_) => return,
        Value::Mapping(task) => task,
        _ => {
            report_wrong_type(name, Dialect::Legacy, findings);
            return;
        }
    };

    check_unsupported_task_fields(name, task, Dialect::Legacy, findings);
    check_executor(name, task, findings);
    check_working_directory(name, task, findings);
}

fn validate_current_task(name: &str, body: &Value, findings: &mut FindingMap) {
    let Some(task) = body.as_mapping() else {
        report_wrong_type(name, Dialect::Current, findings);
        return;
    };

    check_unsupported_task_fields(name, task, Dialect::Current, findings);
    for kind in MappingKind::ALL {
        check_mappings(name, task, kind, findings);
    }
    check_image(name, task, findings);
    check_gpu(task, findings);
    check_default_machine(task, findings);
    check_disable_default_machine_override(task, findings);
    check_working_directory(name, task, findings);
}

fn report_wrong_type(name: &str, dialect: Dialect, findings: &mut FindingMap) {
    findings.set_message(
        "unsupported_fields",
        format!(
            "Module {name} is the wrong type. Modules can only be a YAML dict in version {}",
            dialect.version()
        ),
    );
}

fn check_unsupported_task_fields(
    name: &str,
    task: &Mapping,
    dialect: Dialect,
    findings: &mut FindingMap,
) {
    let errors = task
        .keys()
        .map(key_name)
        .filter(|field| !dialect.accepts_field(field))
        .map(|field| {
            if DEPRECATED_TASK_FIELDS.contains(&field.as_str()) {
                format!("The field \"{field}\" has been deprecated please use \"default_machine\" instead")
            } else {
                format!(
                    "The field \"{field}\" on module \"{name}\" is invalid for \"biolib_version: {}\"",
                    dialect.version()
                )
            }
        })
        .collect();
    findings.set_messages("unsupported_fields", errors);
}

// ---------------------------------------------------------------------------
// Current dialect
// ---------------------------------------------------------------------------

fn targets_app_data(task: &Mapping) -> bool {
    task.get("image")
        .and_then(Value::as_str)
        .is_some_and(|image| image.starts_with(&Environment::AppData.prefix()))
}

fn check_mappings(name: &str, task: &Mapping, kind: MappingKind, findings: &mut FindingMap) {
    let field = kind.field();
    let Some(value) = task.get(field) else {
        if kind != MappingKind::SourceFiles && !targets_app_data(task) {
            findings.set_message(
                field,
                format!("{field} field on module {name} is required. Please specify your {field}."),
            );
        }
        return;
    };
    let Some(items) = value.as_sequence() else {
        findings.set_message(
            field,
            format!(
                "{field} field on module {name} is invalid. Please format the field as a yaml array."
            ),
        );
        return;
    };

    for item in items {
        let Some(directive) = item.as_str() else {
            let err = MappingError::WrongArity;
            findings.set_message(field, mapping_message(field, &key_name(item), name, &err));
            return;
        };
        if let Err(err) = FileMapping::parse(directive) {
            findings.set_message(field, mapping_message(field, directive, name, &err));
            return;
        }
    }
}

fn mapping_message(field: &str, mapping: &str, module: &str, err: &MappingError) -> String {
    const FORMAT_HINT: &str =
        "Please use the format \"COPY from_path to_path\" i.e. \"COPY / /home/biolib/\"";
    let item = format!("{field} item {mapping} on module {module}");
    match err {
        MappingError::WrongArity => format!("{item} is invalid. {FORMAT_HINT}"),
        MappingError::MissingCopy => format!("{item} is missing the COPY command. {FORMAT_HINT}"),
        MappingError::InvalidVariable { path } => format!(
            "{item} in path \"{path}\" is using an invalid variable. Please only use variables \
             referring to an argument number, where \"$1\" refers to the first argument \
             i.e. \"COPY $1 /home/biolib/$1\""
        ),
        MappingError::DirectoryToFile => {
            format!("{item} is invalid. Directories can only map to other directories")
        }
        MappingError::RelativePath { path } => {
            format!("{item} on path \"{path}\" is invalid. Only absolute paths allowed")
        }
        MappingError::ConsecutiveSlashes => {
            format!("{item} is invalid. Directories can not have consecutive slashes")
        }
    }
}

fn check_image(name: &str, task: &Mapping, findings: &mut FindingMap) {
    let Some(value) = task.get("image") else {
        findings.set_message(
            "image",
            format!("You must define an image to use for module {name}."),
        );
        return;
    };

    let parsed = value
        .as_str()
        .ok_or(ImageError::MissingScheme)
        .and_then(ImageUri::parse);
    if let Err(err) = parsed {
        findings.set_message("image", image_message(name, &err));
    }
}

fn image_message(module: &str, err: &ImageError) -> String {
    match err {
        ImageError::MissingScheme => format!(
            "Wrong image format on module {module}. You must define an image using the following \
             format \"environment://image_name:version\""
        ),
        ImageError::UnknownEnvironment { .. } => format!(
            "Wrong environment on image of module {module}. The environment should be specified \
             before \"://\" and can only be one of {}",
            catalog::format_choices(Environment::ALL.map(Environment::as_str))
        ),
        ImageError::Managed(ExecutorError::MissingSeparator) => format!(
            "Missing version on the image of module {module}. A version must be specified at the \
             end of the image like so: \"environment://image_name:version\""
        ),
        ImageError::Managed(ExecutorError::UnknownExecutor { name }) => {
            let namespace = catalog::MANAGED_IMAGE_NAMESPACE;
            format!(
                "Invalid image name {namespace}{name} for biolib executor on module {module}. \
                 The supported biolib executors are {}",
                catalog::format_choices(
                    EXECUTORS
                        .iter()
                        .map(|executor| format!("{namespace}{}", executor.name))
                ),
            )
        }
        ImageError::Managed(ExecutorError::UnsupportedVersion { executor, .. }) => format!(
            "Invalid version for biolib executor {name} on module {module}. The supported \
             versions for {name} are {}",
            catalog::format_choices(executor.supported_versions()),
            name = executor.name,
        ),
    }
}

fn check_gpu(task: &Mapping, findings: &mut FindingMap) {
    let Some(value) = task.get("gpu") else {
        return;
    };
    if value.as_str().and_then(GpuPreference::parse).is_none() {
        findings.set_message(
            "gpu",
            format!(
                "Invalid value for \"gpu\". You can specify one of {}",
                catalog::format_choices(GpuPreference::ALL.map(GpuPreference::as_str))
            ),
        );
    }
}

fn check_default_machine(task: &Mapping, findings: &mut FindingMap) {
    let Some(value) = task.get("default_machine") else {
        return;
    };
    if value.as_str().and_then(catalog::machine_tier).is_none() {
        findings.set_message("default_machine", "Invalid machine type");
    }
    if task.contains_key("gpu") {
        findings.set_message(
            "default_machine",
            "Cannot be specified with the \"gpu\" option",
        );
    }
}

fn check_disable_default_machine_override(task: &Mapping, findings: &mut FindingMap) {
    if task
        .get("disable_default_machine_override")
        .is_some_and(|value| !value.is_bool())
    {
        findings.set_message("disable_default_machine_override", "Must be boolean");
    }
}

// ---------------------------------------------------------------------------
// Legacy dialect
// ---------------------------------------------------------------------------

fn check_executor(name: &str, task: &Mapping, findings: &mut FindingMap) {
    const FORMAT_HINT: &str = "Make sure you follow the format executor_name:version";

    let Some(value) = task.get("executor") else {
        findings.set_message(
            "executor",
            format!("You must define an executor in your module definition; {FORMAT_HINT}"),
        );
        return;
    };
    let spec = key_name(value);
    let parsed = match value.as_str() {
        Some(spec) => ExecutorSpec::parse_legacy(spec).map(|_| ()),
        None => Err(ExecutorError::MissingSeparator),
    };

    let message = match parsed {
        Ok(()) => return,
        Err(ExecutorError::MissingSeparator) => format!(
            "Executor {spec} on module {name} is invalid. Please only use \":\" to separate the \
             executor name from its version i.e. \"python:3.9\"."
        ),
        Err(ExecutorError::UnknownExecutor { .. }) => {
            format!("You provided an invalid executor in module {name}; {FORMAT_HINT}")
        }
        Err(ExecutorError::UnsupportedVersion { executor, .. }) => format!(
            "Invalid version for executor {executor_name} on module {name}. The supported \
             versions for {executor_name} are {}",
            catalog::format_choices(executor.supported_versions()),
            executor_name = executor.name,
        ),
    };
    findings.set_message("executor", message);
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

fn check_working_directory(name: &str, task: &Mapping, findings: &mut FindingMap) {
    let Some(value) = task.get("working_directory") else {
        return;
    };
    let prefix = format!("Wrong path format on working_directory for {name}.");
    let directory = value.as_str().unwrap_or_default();

    let message = if !directory.starts_with('/') {
        format!("{prefix} Directory path must be an absolute path")
    } else if !directory.ends_with('/') {
        format!("{prefix} Directories must end in a slash: \"/dir/sub_dir/\"")
    } else if directory.contains("//") {
        format!("{prefix} Directories can not have consecutive slashes")
    } else {
        return;
    };
    findings.set_message("working_directory", message);
}
