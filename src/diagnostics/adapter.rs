use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::logging::{log_debug, log_error, log_info, log_warn};
use crate::tools::SecurityContext;

use super::normalize::{FIELD_PATH, NormalizedQuery};
use super::render::render;
use super::runner::{DiagnosticKind, RunRequest, Runner};

/// Errors a diagnostics tool call can end in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// A caller-supplied value could not be normalized
    InvalidArgument { field: String, reason: String },
    /// The underlying tool failed or produced output that could not be read
    RunnerFailure(String),
}

impl AdapterError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AdapterError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::InvalidArgument { .. } => "InvalidArgument",
            AdapterError::RunnerFailure(_) => "RunnerFailure",
        }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::InvalidArgument { field, reason } => {
                write!(f, "field '{}': {}", field, reason)
            }
            AdapterError::RunnerFailure(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AdapterError {}

/// What a tool call hands back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<AdapterError> for ToolOutput {
    fn from(err: AdapterError) -> Self {
        ToolOutput::error(format!("error: {}: {}", err.kind(), err))
    }
}

/// Stateless bridge between loosely typed tool arguments and a [`Runner`].
pub struct ToolAdapter {
    kind: DiagnosticKind,
    runner: Arc<dyn Runner>,
    max_locations: Option<usize>,
}

impl ToolAdapter {
    pub fn new(kind: DiagnosticKind, runner: Arc<dyn Runner>) -> Self {
        Self {
            kind,
            runner,
            max_locations: None,
        }
    }

    /// Cap the location lines listed per diagnostic group (builder pattern)
    pub fn with_max_locations(mut self, max_locations: Option<usize>) -> Self {
        self.max_locations = max_locations.filter(|&n| n > 0);
        self
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Run one tool call. Never fails: errors come back as error content.
    pub async fn invoke(&self, request: &Value, context: &SecurityContext) -> ToolOutput {
        match self.try_invoke(request, context).await {
            Ok(text) => ToolOutput::success(text),
            Err(err) => {
                match &err {
                    AdapterError::InvalidArgument { .. } => {
                        log_warn(&format!("Rejected {} request: {}", self.kind, err))
                    }
                    AdapterError::RunnerFailure(_) => {
                        log_error(&format!("{} run failed: {}", self.kind, err))
                    }
                }
                err.into()
            }
        }
    }

    /// Normalize, run and render; the error-returning core of [`invoke`](Self::invoke).
    pub async fn try_invoke(
        &self,
        request: &Value,
        context: &SecurityContext,
    ) -> Result<String, AdapterError> {
        let query = NormalizedQuery::from_request(request)?;
        log_debug(&format!("Normalized {} query: {:?}", self.kind, query));

        let workspace = context
            .resolve_path(query.path.as_deref())
            .map_err(|reason| AdapterError::invalid(FIELD_PATH, reason))?;

        let run_request = RunRequest {
            kind: self.kind,
            workspace,
            query,
        };

        let result = self
            .runner
            .run(&run_request)
            .await
            .map_err(|e| AdapterError::RunnerFailure(e.to_string()))?;

        log_info(&format!(
            "{} diagnostics: {} finding(s) for {}",
            self.kind,
            result.total(),
            run_request.workspace.display()
        ));

        Ok(render(&result, self.max_locations))
    }
}
