use biolib_config_core::{
    Dialect, Document, ErrorReport, Finding, ValidationError, collect_findings, render_text,
    validate_document,
};

const VALID_MANIFEST: &str = r#"
biolib_version: 2
description_file: README.md
license_file: LICENSE
output_type: markdown
consumes_stdin: false
requires_user_identity: true
reserved_machines: 3
remote_hosts:
  - api.example.com
citation:
  entry_type: article
  year: '2023'
modules:
  main:
    image: biolib-app://biolib/python:*
    working_directory: /home/biolib/
    input_files:
      - COPY / /home/biolib/
    output_files:
      - COPY /home/biolib/output/ /
    source_files:
      - COPY /src/ /home/biolib/src/
    default_machine: cpu.small
    disable_default_machine_override: false
  fetch:
    image: dockerhub://ubuntu:22.04
    input_files: [COPY $1 /home/biolib/$1]
    output_files: [COPY /out/ /]
    gpu: preferred
  cache:
    image: app-data://reference-genomes
arguments:
  - key: --input
    type: text-file
    description: Input sequences
    required: true
  - key: --fast
    type: toggle
    description: Skip the slow pass
    options:
      'on': --fast
      'off': ''
  - key: --token
    type: hidden
"#;

fn invalid(yaml: &str) -> ErrorReport {
    let doc = Document::parse(yaml).expect("fixture must parse");
    match validate_document(&doc) {
        Err(ValidationError::Invalid(report)) => report,
        other => panic!("expected accumulated findings, got {other:?}"),
    }
}

fn messages<'a>(report: &'a ErrorReport, path: &[&str]) -> &'a [String] {
    report
        .find(path)
        .and_then(Finding::messages)
        .unwrap_or_else(|| panic!("no messages at {path:?} in {report:#?}"))
}

#[test]
fn valid_manifest_passes() {
    let doc = Document::parse(VALID_MANIFEST).unwrap();
    assert_eq!(validate_document(&doc), Ok(()));
}

#[test]
fn missing_version_is_fatal() {
    let doc = Document::parse("output_type: pdf\nmodules: {'bad name': {}}\n").unwrap();
    let err = validate_document(&doc).unwrap_err();
    assert_eq!(err, ValidationError::MissingVersion);
    assert_eq!(
        render_text(&err.to_report()),
        "Validation errors:\n\n[config_yml]\n  - Your config file is missing the biolib_version field.\n"
    );
}

#[test]
fn unsupported_version_is_fatal() {
    for version in ["1", "3", "'2'", "two"] {
        let doc = Document::parse(&format!("biolib_version: {version}\nbogus: true\n")).unwrap();
        let err = validate_document(&doc).unwrap_err();
        assert!(
            matches!(err, ValidationError::UnsupportedVersion { .. }),
            "version {version}: {err:?}"
        );
    }
}

#[test]
fn invalid_output_type_names_allowed_values() {
    let report = invalid("biolib_version: 2\noutput_type: pdf\n");
    assert_eq!(report.message_count(), 1);
    assert_eq!(
        messages(&report, &["config_yml", "output_type"]),
        &["Invalid output_type specified for your app. output_type can be one of ['text', 'markdown', 'html']".to_string()]
    );
}

#[test]
fn bad_module_name_skips_body_checks() {
    let report = invalid(
        "biolib_version: 2\nmodules:\n  step 1:\n    image: nope\n    unknown_field: 1\n",
    );
    let found = messages(&report, &["config_yml", "modules", "step 1"]);
    assert_eq!(found.len(), 1);
    assert!(found[0].starts_with("The module name step 1 is invalid"), "{found:?}");
}

#[test]
fn module_name_grammar() {
    for name in ["a--b", "a__b", "-a", "a-", "_a", "a_", "a.b", "a/b"] {
        let yaml = format!("biolib_version: 2\nmodules:\n  '{name}':\n    image: x\n");
        let report = invalid(&yaml);
        assert!(
            report.find(&["config_yml", "modules", name]).and_then(Finding::messages).is_some(),
            "name {name} should be rejected"
        );
    }
}

#[test]
fn file_mapping_directory_rules() {
    let manifest = |mapping: &str| {
        format!(
            "biolib_version: 2\nmodules:\n  main:\n    image: local-docker://tool:1\n    input_files: ['{mapping}']\n    output_files: [COPY /out/ /]\n"
        )
    };

    let report = invalid(&manifest("COPY /a/ /b"));
    assert_eq!(
        messages(&report, &["config_yml", "modules", "main", "input_files"]),
        &["input_files item COPY /a/ /b on module main is invalid. Directories can only map to other directories".to_string()]
    );

    for accepted in ["COPY /a/ /b/", "COPY /a $1"] {
        let doc = Document::parse(&manifest(accepted)).unwrap();
        assert_eq!(validate_document(&doc), Ok(()), "mapping {accepted}");
    }

    let report = invalid(&manifest("COPY /a $0"));
    assert!(
        messages(&report, &["config_yml", "modules", "main", "input_files"])[0]
            .contains("is using an invalid variable")
    );
}

#[test]
fn toggle_options_must_be_on_and_off() {
    let report = invalid(
        "biolib_version: 2\narguments:\n  - key: --x\n    type: toggle\n    description: d\n    options: {'yes': a, 'no': b}\n",
    );
    assert!(messages(&report, &["config_yml", "arguments", "--x", "type"])[0]
        .starts_with("The two options on arguments of type toggle must be named"));

    let doc = Document::parse(
        "biolib_version: 2\narguments:\n  - key: --x\n    type: toggle\n    description: d\n    options: {'on': a, 'off': b}\n",
    )
    .unwrap();
    assert_eq!(validate_document(&doc), Ok(()));
}

#[test]
fn argument_without_key_is_one_generic_finding() {
    let report = invalid(
        "biolib_version: 2\narguments:\n  - type: not-a-type\n    colour: red\n",
    );
    assert_eq!(report.message_count(), 1);
    assert_eq!(
        messages(&report, &["config_yml", "arguments", "required"]),
        &["One of your arguments is missing a key. Please specify a key for each of your arguments".to_string()]
    );
}

#[test]
fn argument_without_type_is_rejected() {
    let report = invalid(
        "biolib_version: 2\nmodules:\n  main:\n    image: app-data://x\narguments:\n  - key: --input\n",
    );
    assert_eq!(report.message_count(), 1);
    assert!(
        messages(&report, &["config_yml", "arguments", "--input", "type"])[0]
            .starts_with("Missing type on argument --input. type can be one of ['drag-and-drop-file',")
    );
}

#[test]
fn unknown_executor_image_lists_managed_executors() {
    let report = invalid(
        "biolib_version: 2\nmodules:\n  main:\n    image: biolib-app://biolib/java:17\n    input_files: []\n    output_files: []\n",
    );
    assert_eq!(
        messages(&report, &["config_yml", "modules", "main", "image"]),
        &["Invalid image name biolib/java for biolib executor on module main. The supported biolib executors are ['biolib/python', 'biolib/r', 'biolib/node']".to_string()]
    );
}

#[test]
fn findings_from_all_stages_accumulate() {
    let report = invalid(
        r#"
biolib_version: 2
unknown: 1
reserved_machines: 0
modules:
  main:
    image: biolib-app://biolib/python
    working_directory: home
    default_machine: cpu.huge
arguments:
  - key: --n
    type: number
"#,
    );
    let root = report.find(&["config_yml"]).and_then(Finding::as_map).unwrap();
    assert_eq!(
        root.keys().collect::<Vec<_>>(),
        vec!["unsupported_fields", "reserved_machines", "modules", "arguments"]
    );

    let module = report
        .find(&["config_yml", "modules", "main"])
        .and_then(Finding::as_map)
        .unwrap();
    assert_eq!(
        module.keys().collect::<Vec<_>>(),
        vec![
            "input_files",
            "output_files",
            "image",
            "default_machine",
            "working_directory"
        ]
    );
    assert_eq!(
        messages(&report, &["config_yml", "arguments", "--n", "argument_description"]),
        &["Could not find a description for argument --n. Please provide a description for --n".to_string()]
    );
}

#[test]
fn validation_is_deterministic() {
    let yaml = "biolib_version: 2\nb: 1\na: 2\nmodules:\n  z: {image: x}\n  a: {image: y}\narguments: [{key: k}, {type: text}]\n";
    let doc = Document::parse(yaml).unwrap();
    let first = collect_findings(&doc, Dialect::Current);
    let second = collect_findings(&doc, Dialect::Current);
    assert_eq!(first, second);
    assert_eq!(render_text(&first), render_text(&second));
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn legacy_modules_validate_executor() {
    let doc = Document::parse(
        "biolib_version: 1\nmodules:\n  main:\n    executor: python:*\n    path: main.py\n  other: some-app\n  broken:\n    executor: cobol:1\n",
    )
    .unwrap();
    let report = collect_findings(&doc, Dialect::Legacy);
    assert!(report.find(&["config_yml", "modules", "main"]).is_none());
    assert!(report.find(&["config_yml", "modules", "other"]).is_none());
    assert_eq!(
        messages(&report, &["config_yml", "modules", "broken", "executor"]),
        &["You provided an invalid executor in module broken; Make sure you follow the format executor_name:version".to_string()]
    );
}

#[test]
fn report_serializes_as_nested_map() {
    let report = invalid("biolib_version: 2\noutput_type: pdf\n");
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["config_yml"]["output_type"][0].as_str().is_some());
}
