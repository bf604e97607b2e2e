//! Compact text encoding of runner results.
//!
//! Findings are grouped by diagnostic identifier so the message text, which
//! is usually identical for every occurrence, is sent to the model once:
//!
//! ```text
//! 4 diagnostics in 2 groups
//! IDE0005 [warning] x3: Using directive is unnecessary.
//!   src/Program.cs:1
//!   src/Program.cs:2
//!   src/Worker.cs:1
//! CA1822 [error] x1: Member 'Run' does not access instance data
//!   src/Worker.cs:40
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use super::normalize::Severity;
use super::runner::{Finding, RunnerResult};

/// One diagnostic identifier and every place it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticGroup<'a> {
    pub id: &'a str,
    pub severity: Severity,
    pub message: &'a str,
    pub locations: Vec<&'a Finding>,
}

impl DiagnosticGroup<'_> {
    pub fn count(&self) -> usize {
        self.locations.len()
    }
}

/// Group findings by identifier: count descending, then identifier.
/// Locations keep runner order; the first occurrence supplies the message.
pub fn group_findings(findings: &[Finding]) -> Vec<DiagnosticGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DiagnosticGroup<'_>> = Vec::new();

    for finding in findings {
        match index.get(finding.id.as_str()) {
            Some(&slot) => {
                let group = &mut groups[slot];
                group.severity = group.severity.max(finding.severity);
                group.locations.push(finding);
            }
            None => {
                index.insert(finding.id.as_str(), groups.len());
                groups.push(DiagnosticGroup {
                    id: &finding.id,
                    severity: finding.severity,
                    message: &finding.message,
                    locations: vec![finding],
                });
            }
        }
    }

    groups.sort_by(|a, b| b.count().cmp(&a.count()).then_with(|| a.id.cmp(b.id)));
    groups
}

/// Render a result. `max_locations` caps the location lines per group
/// (`None` lists all of them).
pub fn render(result: &RunnerResult, max_locations: Option<usize>) -> String {
    if result.findings.is_empty() {
        return "0 diagnostics".to_string();
    }

    let groups = group_findings(&result.findings);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} diagnostics in {} groups",
        result.total(),
        groups.len()
    );

    for group in &groups {
        let _ = writeln!(
            out,
            "{} [{}] x{}: {}",
            group.id,
            group.severity,
            group.count(),
            group.message
        );

        let shown = max_locations.unwrap_or(usize::MAX).min(group.count());
        for finding in &group.locations[..shown] {
            let _ = writeln!(out, "  {}:{}", finding.file, finding.line);
        }
        if shown < group.count() {
            let _ = writeln!(out, "  ... {} more", group.count() - shown);
        }
    }

    out.truncate(out.trim_end().len());
    out
}
