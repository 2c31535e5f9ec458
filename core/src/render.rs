//! Human-readable rendering of an [`ErrorReport`].

use std::fmt::Write;

use crate::report::{ErrorReport, Finding, FindingMap};

const HEADER: &str = "Validation errors:";
const INDENT: &str = "  ";

/// Renders `report` as the text printed by the command-line checker.
///
/// Each section starts with a `[name]` line. Fields are listed below it as
/// `name:` headers with one `- message` bullet per finding; nested scopes
/// such as modules and arguments indent one level further per depth.
///
/// # Examples
///
/// ```
/// use biolib_config_core::{ErrorReport, FindingMap, render_text};
///
/// let mut section = FindingMap::new();
/// section.set_message("output_type", "bad output type");
///
/// assert_eq!(
///     render_text(&ErrorReport::from_section(section)),
///     "Validation errors:\n\n[config_yml]\n  output_type:\n    - bad output type\n",
/// );
/// ```
pub fn render_text(report: &ErrorReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADER}");
    for (section, finding) in report.sections().iter() {
        let _ = writeln!(out, "\n[{section}]");
        write_finding(&mut out, finding, 1);
    }
    out
}

fn write_finding(out: &mut String, finding: &Finding, depth: usize) {
    match finding {
        Finding::Messages(messages) => {
            let indent = INDENT.repeat(depth);
            for message in messages {
                let _ = writeln!(out, "{indent}- {message}");
            }
        }
        Finding::Nested(map) => write_map(out, map, depth),
    }
}

fn write_map(out: &mut String, map: &FindingMap, depth: usize) {
    let indent = INDENT.repeat(depth);
    for (name, finding) in map.iter() {
        let _ = writeln!(out, "{indent}{name}:");
        write_finding(out, finding, depth + 1);
    }
}
