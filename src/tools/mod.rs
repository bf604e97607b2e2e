/// Tools the model can call
///
/// - Tool trait and registry for defining and listing tools
/// - Security context confining tool paths to the working directory
/// - Tool executor dispatching model tool calls
/// - The two diagnostics tools backed by `dotnet format`
mod diagnostics;
mod executor;
mod registry;
mod security;

use std::sync::Arc;

use crate::diagnostics::Runner;

pub use diagnostics::{ANALYZERS_TOOL_NAME, DiagnosticsTool, STYLE_TOOL_NAME};
pub use executor::ToolExecutor;
pub use registry::{TdaTool, ToolRegistry};
pub use security::SecurityContext;

impl ToolRegistry {
    /// Registry with both diagnostics tools sharing one runner
    pub fn with_diagnostics(runner: Arc<dyn Runner>, max_locations: Option<usize>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DiagnosticsTool::style(
            runner.clone(),
            max_locations,
        )));
        registry.register(Box::new(DiagnosticsTool::analyzers(runner, max_locations)));
        registry
    }
}
