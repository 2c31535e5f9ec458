//! Document-level field validators.
//!
//! Each check looks at one top-level field in isolation and records its
//! findings under that field's name. Checks never stop each other, and a
//! missing field is never an error on its own.

use serde_yaml::Value;

use crate::catalog::{self, RESERVED_MACHINES_MAX, ROOT_FIELDS, STDOUT_RENDER_TYPES};
use crate::document::Document;
use crate::report::FindingMap;

/// A document-level check.
pub type DocumentCheck = fn(&Document, &mut FindingMap);

/// Checks run against every document, in reporting order.
pub const DOCUMENT_CHECKS: &[(&str, DocumentCheck)] = &[
    ("unsupported_fields", check_unsupported_fields),
    ("reserved_machines", check_reserved_machines),
    ("output_type", check_output_type),
    ("main_output_file", check_main_output_file),
    ("consumes_stdin", check_consumes_stdin),
    ("requires_user_identity", check_requires_user_identity),
    ("remote_hosts", check_remote_hosts),
    ("citation", check_citation),
    ("description_file", check_description_file),
    ("license_file", check_license_file),
];

/// Runs every document-level check and returns their merged findings.
pub fn validate_document_fields(doc: &Document) -> FindingMap {
    let mut findings = FindingMap::new();
    for (name, check) in DOCUMENT_CHECKS {
        let before = findings.message_count();
        check(doc, &mut findings);
        if findings.message_count() != before {
            tracing::debug!(check = *name, "Document check reported findings");
        }
    }
    findings
}

pub fn check_unsupported_fields(doc: &Document, findings: &mut FindingMap) {
    let errors: Vec<String> = doc
        .keys()
        .filter(|field| !ROOT_FIELDS.contains(&field.as_str()))
        .map(|field| format!("The field {field} is not valid"))
        .collect();
    findings.set_messages("unsupported_fields", errors);
}

pub fn check_reserved_machines(doc: &Document, findings: &mut FindingMap) {
    let Some(value) = doc.get("reserved_machines") else {
        return;
    };
    let count = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_u64().map(|_| i64::MAX)),
        _ => None,
    };
    match count {
        Some(count) if (1..=RESERVED_MACHINES_MAX).contains(&count) => {}
        Some(count) if count > RESERVED_MACHINES_MAX => findings.set_message(
            "reserved_machines",
            format!("reserved_machines must be less than {RESERVED_MACHINES_MAX}"),
        ),
        _ => findings.set_message(
            "reserved_machines",
            "reserved_machines must be a positive integer",
        ),
    }
}

pub fn check_output_type(doc: &Document, findings: &mut FindingMap) {
    let Some(value) = doc.get("output_type") else {
        return;
    };
    if doc.contains("main_output_file") {
        findings.set_message(
            "output_type",
            "output_type and main_output_file can not be specified at the same time",
        );
        return;
    }
    let valid = value
        .as_str()
        .is_some_and(|output_type| STDOUT_RENDER_TYPES.contains(&output_type));
    if !valid {
        findings.set_message(
            "output_type",
            format!(
                "Invalid output_type specified for your app. output_type can be one of {}",
                catalog::format_choices(STDOUT_RENDER_TYPES)
            ),
        );
    }
}

pub fn check_main_output_file(doc: &Document, findings: &mut FindingMap) {
    let Some(value) = doc.get("main_output_file") else {
        return;
    };
    let Some(path) = value.as_str() else {
        findings.set_message(
            "main_output_file",
            "Invalid main_output_file specified for your app. main_output_file must be a string",
        );
        return;
    };
    if !path.starts_with('/') {
        findings.set_message(
            "main_output_file",
            "Path to main_output_file must be absolute (start with \"/\")",
        );
    }
}

fn check_boolean(doc: &Document, findings: &mut FindingMap, field: &str) {
    if doc.get(field).is_some_and(|value| !value.is_bool()) {
        findings.set_message(
            field,
            format!(
                "Invalid {field} specified for your app. {field} can be true or false"
            ),
        );
    }
}

pub fn check_consumes_stdin(doc: &Document, findings: &mut FindingMap) {
    check_boolean(doc, findings, "consumes_stdin");
}

pub fn check_requires_user_identity(doc: &Document, findings: &mut FindingMap) {
    check_boolean(doc, findings, "requires_user_identity");
}

pub fn check_remote_hosts(doc: &Document, findings: &mut FindingMap) {
    let Some(value) = doc.get("remote_hosts") else {
        return;
    };
    let Some(hosts) = value.as_sequence() else {
        findings.set_message(
            "remote_hosts",
            "Invalid remote_hosts specified for your app. remote_hosts must be a list of hostnames",
        );
        return;
    };
    if hosts.iter().any(|host| !host.is_string()) {
        findings.set_message(
            "remote_hosts",
            "Invalid hostname in remote_hosts. All hostnames must be strings",
        );
    }
}

pub fn check_citation(doc: &Document, findings: &mut FindingMap) {
    let Some(value) = doc.get("citation") else {
        return;
    };
    let Some(citation) = value.as_mapping() else {
        findings.set_message(
            "citation",
            "Invalid citation specified for your app. citation must be a dictionary",
        );
        return;
    };
    if !citation.contains_key("entry_type") {
        findings.set_message(
            "citation",
            "Missing entry_type in citation. entry_type is required",
        );
        return;
    }
    if citation.get("year").is_some_and(|year| !year.is_string()) {
        findings.set_message("citation", "Year in citation must be a string");
    }
}

fn check_string(doc: &Document, findings: &mut FindingMap, field: &str) {
    if doc.get(field).is_some_and(|value| !value.is_string()) {
        findings.set_message(
            field,
            format!("Invalid {field} specified for your app. {field} must be a string"),
        );
    }
}

pub fn check_description_file(doc: &Document, findings: &mut FindingMap) {
    check_string(doc, findings, "description_file");
}

pub fn check_license_file(doc: &Document, findings: &mut FindingMap) {
    check_string(doc, findings, "license_file");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn findings(yaml: &str) -> FindingMap {
        validate_document_fields(&Document::parse(yaml).unwrap())
    }

    fn only_message(map: &FindingMap, key: &str) -> String {
        let messages = map.get(key).and_then(|f| f.messages()).unwrap();
        assert_eq!(messages.len(), 1, "expected one message under {key}");
        messages[0].clone()
    }

    #[test]
    fn test_clean_document_has_no_findings() {
        let map = findings(
            "biolib_version: 2\noutput_type: html\nconsumes_stdin: true\nremote_hosts: [example.com]\n",
        );
        assert!(map.is_empty(), "{map:?}");
    }

    #[test]
    fn test_unsupported_fields_are_each_reported() {
        let map = findings("biolib_version: 2\nfoo: 1\nbar: 2\n");
        assert_eq!(
            map.get("unsupported_fields").and_then(|f| f.messages()).unwrap(),
            &[
                "The field foo is not valid".to_string(),
                "The field bar is not valid".to_string()
            ]
        );
    }

    #[test]
    fn test_reserved_machines_bounds() {
        assert!(findings("reserved_machines: 25\n").is_empty());
        assert_eq!(
            only_message(&findings("reserved_machines: 26\n"), "reserved_machines"),
            "reserved_machines must be less than 25"
        );
        for bad in ["0", "-3", "1.5", "'3'", "true"] {
            assert_eq!(
                only_message(&findings(&format!("reserved_machines: {bad}\n")), "reserved_machines"),
                "reserved_machines must be a positive integer",
                "value {bad}"
            );
        }
    }

    #[test]
    fn test_output_type_and_main_output_file_are_exclusive() {
        let map = findings("output_type: pdf\nmain_output_file: relative.txt\n");
        assert_eq!(
            only_message(&map, "output_type"),
            "output_type and main_output_file can not be specified at the same time"
        );
        // main_output_file is still checked on its own.
        assert_eq!(
            only_message(&map, "main_output_file"),
            "Path to main_output_file must be absolute (start with \"/\")"
        );
    }

    #[test]
    fn test_output_type_names_allowed_values() {
        assert_eq!(
            only_message(&findings("output_type: pdf\n"), "output_type"),
            "Invalid output_type specified for your app. output_type can be one of ['text', 'markdown', 'html']"
        );
    }

    #[test]
    fn test_type_checks() {
        let map = findings(
            "consumes_stdin: 'yes'\nrequires_user_identity: 1\nremote_hosts: [a, 2]\ndescription_file: 3\nlicense_file: [x]\nmain_output_file: 4\n",
        );
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            vec![
                "main_output_file",
                "consumes_stdin",
                "requires_user_identity",
                "remote_hosts",
                "description_file",
                "license_file"
            ]
        );
        assert_eq!(
            only_message(&map, "remote_hosts"),
            "Invalid hostname in remote_hosts. All hostnames must be strings"
        );
    }

    #[test]
    fn test_remote_hosts_must_be_a_list() {
        assert_eq!(
            only_message(&findings("remote_hosts: example.com\n"), "remote_hosts"),
            "Invalid remote_hosts specified for your app. remote_hosts must be a list of hostnames"
        );
    }

    #[test]
    fn test_citation_rules() {
        assert!(findings("citation: {entry_type: article, year: '2020'}\n").is_empty());
        assert_eq!(
            only_message(&findings("citation: [a]\n"), "citation"),
            "Invalid citation specified for your app. citation must be a dictionary"
        );
        assert_eq!(
            only_message(&findings("citation: {year: 2020}\n"), "citation"),
            "Missing entry_type in citation. entry_type is required"
        );
        assert_eq!(
            only_message(&findings("citation: {entry_type: article, year: 2020}\n"), "citation"),
            "Year in citation must be a string"
        );
    }
}
