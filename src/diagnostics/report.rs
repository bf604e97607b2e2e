//! Parser for the JSON report written by `dotnet format --report`.

use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

use super::normalize::Severity;
use super::runner::Finding;

/// File name `dotnet format` uses when `--report` points at a directory.
pub const REPORT_FILE_NAME: &str = "format-report.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReportDocument {
    #[serde(default)]
    file_name: String,
    #[serde(default)]
    file_path: String,
    #[serde(default)]
    file_changes: Vec<ReportChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReportChange {
    line_number: u32,
    #[serde(default)]
    char_number: u32,
    diagnostic_id: String,
    #[serde(default)]
    format_description: String,
}

/// Matches descriptions such as `warning CA1822: Member 'Run' does not access instance data`.
fn description_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)^\s*(error|warning|info|hidden)\s+([A-Za-z]+[0-9]+)\s*:\s*(.*)$")
            .expect("description pattern is valid")
    })
}

/// Parse a report into findings, in report order.
///
/// `fallback` is used as severity for changes whose description does not
/// name one (whitespace fixes, for instance).
pub fn parse_report(
    bytes: &[u8],
    workspace: &Path,
    fallback: Severity,
) -> Result<Vec<Finding>, String> {
    let documents: Vec<ReportDocument> =
        serde_json::from_slice(bytes).map_err(|e| format!("invalid report JSON: {}", e))?;

    let base = workspace_dir(workspace);
    let mut findings = Vec::new();

    for document in documents {
        let file = display_path(&document, base);
        for change in document.file_changes {
            let (severity, message) = split_description(&change.format_description, fallback);
            findings.push(Finding {
                file: file.clone(),
                line: change.line_number,
                column: change.char_number,
                id: change.diagnostic_id,
                severity,
                message,
            });
        }
    }

    Ok(findings)
}

fn split_description(description: &str, fallback: Severity) -> (Severity, String) {
    if let Some(caps) = description_pattern().captures(description)
        && let Ok(severity) = caps[1].parse::<Severity>()
    {
        return (severity, single_line(&caps[3]));
    }
    (fallback, single_line(description))
}

/// Collapse every whitespace run, newlines included, to one space.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Directory the report paths should be shown relative to.
fn workspace_dir(workspace: &Path) -> &Path {
    if workspace.is_file() {
        workspace.parent().unwrap_or(workspace)
    } else {
        workspace
    }
}

fn display_path(document: &ReportDocument, base: &Path) -> String {
    if document.file_path.is_empty() {
        return document.file_name.clone();
    }
    let full = Path::new(&document.file_path);
    full.strip_prefix(base)
        .unwrap_or(full)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"[
      {
        "DocumentId": { "ProjectId": { "Id": "0d7f" }, "Id": "2c1a" },
        "FileName": "Program.cs",
        "FilePath": "/repo/src/Program.cs",
        "FileChanges": [
          {
            "LineNumber": 12,
            "CharNumber": 9,
            "DiagnosticId": "IDE0005",
            "FormatDescription": "warning IDE0005: Using directive is unnecessary."
          },
          {
            "LineNumber": 30,
            "CharNumber": 1,
            "DiagnosticId": "WHITESPACE",
            "FormatDescription": "Fix whitespace formatting. Replace 2 characters with '\\s\\s'."
          }
        ]
      },
      {
        "FileName": "Worker.cs",
        "FilePath": "/elsewhere/Worker.cs",
        "FileChanges": [
          {
            "LineNumber": 4,
            "CharNumber": 17,
            "DiagnosticId": "CA1822",
            "FormatDescription": "error CA1822: Member 'Run' does not access instance data"
          }
        ]
      }
    ]"#;

    #[test]
    fn test_parse_sample_report() {
        let findings =
            parse_report(SAMPLE.as_bytes(), Path::new("/repo"), Severity::Info).unwrap();

        assert_eq!(findings.len(), 3);

        assert_eq!(findings[0].file, "src/Program.cs");
        assert_eq!(findings[0].line, 12);
        assert_eq!(findings[0].column, 9);
        assert_eq!(findings[0].id, "IDE0005");
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].message, "Using directive is unnecessary.");

        assert_eq!(findings[1].id, "WHITESPACE");
        assert_eq!(findings[1].severity, Severity::Info);
        assert!(findings[1].message.starts_with("Fix whitespace formatting."));

        assert_eq!(findings[2].file, "/elsewhere/Worker.cs");
        assert_eq!(findings[2].severity, Severity::Error);
    }

    #[test]
    fn test_paths_relative_to_solution_directory() {
        let temp_dir = TempDir::new().unwrap();
        let solution = temp_dir.path().join("App.sln");
        std::fs::write(&solution, "").unwrap();

        let report = format!(
            r#"[{{"FileName":"A.cs","FilePath":"{}","FileChanges":[{{"LineNumber":1,"CharNumber":1,"DiagnosticId":"IDE0161","FormatDescription":"info IDE0161: Convert to file-scoped namespace"}}]}}]"#,
            temp_dir
                .path()
                .join("lib")
                .join("A.cs")
                .to_string_lossy()
                .replace('\\', "\\\\")
        );

        let findings = parse_report(report.as_bytes(), &solution, Severity::Warning).unwrap();
        assert_eq!(findings[0].file, "lib/A.cs");
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_multiline_description_becomes_one_line() {
        let report = r#"[{"FileName":"A.cs","FilePath":"/repo/A.cs","FileChanges":[
            {"LineNumber":7,"CharNumber":1,"DiagnosticId":"CA2007","FormatDescription":"warning CA2007: Consider calling\n  ConfigureAwait\r\non the awaited task"},
            {"LineNumber":8,"CharNumber":1,"DiagnosticId":"WHITESPACE","FormatDescription":"Fix whitespace\n\tformatting."}
        ]}]"#;

        let findings =
            parse_report(report.as_bytes(), Path::new("/repo"), Severity::Info).unwrap();
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(
            findings[0].message,
            "Consider calling ConfigureAwait on the awaited task"
        );
        assert_eq!(findings[1].message, "Fix whitespace formatting.");
    }

    #[test]
    fn test_empty_report() {
        let findings = parse_report(b"[]", Path::new("/repo"), Severity::Warning).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_malformed_report() {
        let err = parse_report(b"not json", Path::new("/repo"), Severity::Warning).unwrap_err();
        assert!(err.contains("invalid report JSON"));
    }
}
