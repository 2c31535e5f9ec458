//! Validation of BioLib application manifests (`.biolib/config.yml`).
//!
//! A manifest is parsed into a [`Document`] and checked in stages:
//!
//! - the `biolib_version` gate ([`validate_version`]), which fails fast with a
//!   fatal [`ValidationError`] and selects the task [`Dialect`];
//! - document-level fields ([`fields`]);
//! - every module ([`task`]), using the micro-grammars in [`grammar`] and
//!   the rule tables in [`catalog`];
//! - every argument ([`argument`]).
//!
//! All findings past the version gate are accumulated into one
//! [`ErrorReport`] rather than stopping at the first problem.
//! [`render_text`] turns a report into the text the command-line checker
//! prints.
//!
//! # Example
//!
//! ```
//! use biolib_config_core::*;
//!
//! let doc = Document::parse(
//!     r#"
//! biolib_version: 2
//! modules:
//!   main:
//!     image: local-docker://my-tool:latest
//!     working_directory: /home/biolib/
//!     input_files: [COPY / /home/biolib/]
//!     output_files: [COPY /home/biolib/out/ /]
//! arguments:
//!   - key: --input
//!     type: text-file
//!     description: Sequence to analyse
//! "#,
//! )
//! .unwrap();
//! assert_eq!(validate_document(&doc), Ok(()));
//!
//! let doc = Document::parse("biolib_version: 2\nmodules:\n  main:\n    image: ftp://x\n").unwrap();
//! let err = validate_document(&doc).unwrap_err();
//! let text = render_text(&err.to_report());
//! assert!(text.contains("  modules:\n    main:\n"));
//! assert!(text.contains("      image:\n        - Wrong environment on image of module main."));
//! ```

pub mod argument;
pub mod catalog;
mod document;
mod error;
pub mod fields;
pub mod grammar;
mod render;
mod report;
pub mod task;
mod validate;

pub use document::Document;
pub use error::{LoadError, Result, ValidationError};
pub use render::render_text;
pub use report::{ErrorReport, Finding, FindingMap, ROOT_SECTION};
pub use task::Dialect;
pub use validate::{collect_findings, validate_document, validate_version};
