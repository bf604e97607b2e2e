use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::diagnostics::{DiagnosticKind, Runner, ToolAdapter, ToolOutput};

use super::registry::TdaTool;
use super::security::SecurityContext;

pub const STYLE_TOOL_NAME: &str = "extract_style_diagnostics";
pub const ANALYZERS_TOOL_NAME: &str = "extract_analyzers_diagnostics";

/// Exposes one [`ToolAdapter`] to the model.
pub struct DiagnosticsTool {
    adapter: ToolAdapter,
}

impl DiagnosticsTool {
    pub fn new(adapter: ToolAdapter) -> Self {
        Self { adapter }
    }

    pub fn style(runner: Arc<dyn Runner>, max_locations: Option<usize>) -> Self {
        Self::new(ToolAdapter::new(DiagnosticKind::Style, runner).with_max_locations(max_locations))
    }

    pub fn analyzers(runner: Arc<dyn Runner>, max_locations: Option<usize>) -> Self {
        Self::new(
            ToolAdapter::new(DiagnosticKind::Analyzers, runner).with_max_locations(max_locations),
        )
    }
}

#[async_trait]
impl TdaTool for DiagnosticsTool {
    fn name(&self) -> &str {
        match self.adapter.kind() {
            DiagnosticKind::Style => STYLE_TOOL_NAME,
            DiagnosticKind::Analyzers => ANALYZERS_TOOL_NAME,
        }
    }

    fn description(&self) -> &str {
        match self.adapter.kind() {
            DiagnosticKind::Style => {
                "Extract code style diagnostics (IDE rules, whitespace formatting) from a .NET \
                 project, solution or folder. Results are grouped by diagnostic id with a count, \
                 the message once, and file:line locations."
            }
            DiagnosticKind::Analyzers => {
                "Extract analyzer diagnostics (CA rules and third-party analyzers) from a .NET \
                 project, solution or folder. Results are grouped by diagnostic id with a count, \
                 the message once, and file:line locations."
            }
        }
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Project, solution or folder to analyze, relative to the working directory. Omit to analyze the working directory."
                },
                "severity": {
                    "type": "string",
                    "enum": ["error", "warning", "info", "hidden"],
                    "description": "Minimum severity to report. Omit for the default (warning and above)."
                },
                "include": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Literal file or folder paths to restrict the analysis to. Omit to analyze everything."
                },
                "diagnostics": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Diagnostic ids to report (e.g. IDE0055, CA1822). Omit to report all."
                }
            }
        })
    }

    async fn execute(&self, args: Value, context: &SecurityContext) -> ToolOutput {
        self.adapter.invoke(&args, context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{RunRequest, RunnerError, RunnerResult};

    struct NeverRunner;

    #[async_trait]
    impl Runner for NeverRunner {
        async fn run(&self, _request: &RunRequest) -> Result<RunnerResult, RunnerError> {
            Err(RunnerError::Spawn("not available in tests".to_string()))
        }
    }

    #[test]
    fn test_names_follow_kind() {
        let runner: Arc<dyn Runner> = Arc::new(NeverRunner);
        assert_eq!(
            DiagnosticsTool::style(runner.clone(), None).name(),
            "extract_style_diagnostics"
        );
        assert_eq!(
            DiagnosticsTool::analyzers(runner, None).name(),
            "extract_analyzers_diagnostics"
        );
    }

    #[test]
    fn test_schema_declares_optional_fields() {
        let tool = DiagnosticsTool::style(Arc::new(NeverRunner), None);
        let schema = tool.schema();
        for field in ["path", "severity", "include", "diagnostics"] {
            assert!(schema["properties"].get(field).is_some(), "{field}");
        }
        assert!(schema.get("required").is_none());
    }

    #[tokio::test]
    async fn test_execute_reports_runner_failure() {
        let tool = DiagnosticsTool::analyzers(Arc::new(NeverRunner), None);
        let output = tool.execute(json!({}), &SecurityContext::new()).await;
        assert!(output.is_error);
        assert!(output.text.contains("RunnerFailure"));
        assert!(output.text.contains("not available in tests"));
    }
}
