use genai::chat::{ToolCall, ToolResponse};
use serde_json::Value;

use crate::diagnostics::ToolOutput;
use crate::logging::{log_debug, log_error, log_info, log_warn};

use super::registry::ToolRegistry;
use super::security::SecurityContext;

/// Dispatches tool calls to the registry under one security context.
pub struct ToolExecutor {
    registry: ToolRegistry,
    security_context: SecurityContext,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, security_context: SecurityContext) -> Self {
        Self {
            registry,
            security_context,
        }
    }

    /// Run a tool by name. Unknown names come back as error content.
    pub async fn execute(&self, name: &str, args: Value) -> ToolOutput {
        log_debug(&format!("Tool arguments for {}: {}", name, args));

        let Some(tool) = self.registry.get(name) else {
            log_error(&format!("Unknown tool requested: {}", name));
            return ToolOutput::error(format!(
                "error: UnknownTool: '{}' (available: {})",
                name,
                self.registry.names().join(", ")
            ));
        };

        let output = tool.execute(args, &self.security_context).await;
        if output.is_error {
            log_warn(&format!("Tool {} returned an error: {}", name, output.text));
        } else {
            log_info(&format!(
                "Tool {} succeeded, output length: {}",
                name,
                output.text.len()
            ));
        }
        output
    }

    /// Execute a single model tool call
    pub async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolResponse {
        log_info(&format!(
            "Executing tool: {} (call_id: {})",
            tool_call.fn_name, tool_call.call_id
        ));

        let output = self
            .execute(&tool_call.fn_name, tool_call.fn_arguments.clone())
            .await;

        ToolResponse::new(tool_call.call_id.clone(), output.text)
    }

    /// Execute multiple tool calls concurrently, responses in call order
    pub async fn execute_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<ToolResponse> {
        log_info(&format!("Executing {} tool call(s)", tool_calls.len()));

        let futures: Vec<_> = tool_calls
            .iter()
            .map(|tc| self.execute_tool_call(tc))
            .collect();

        futures::future::join_all(futures).await
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn security_context(&self) -> &SecurityContext {
        &self.security_context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::TdaTool;
    use async_trait::async_trait;
    use serde_json::json;

    struct UpperTool;

    #[async_trait]
    impl TdaTool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase the 'text' argument"
        }

        fn schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, args: Value, _context: &SecurityContext) -> ToolOutput {
            match args.get("text").and_then(Value::as_str) {
                Some(text) => ToolOutput::success(text.to_uppercase()),
                None => ToolOutput::error("error: InvalidArgument: field 'text': missing"),
            }
        }
    }

    fn executor() -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(UpperTool));
        ToolExecutor::new(registry, SecurityContext::new())
    }

    fn call(id: &str, name: &str, args: Value) -> ToolCall {
        serde_json::from_value(json!({
            "call_id": id,
            "fn_name": name,
            "fn_arguments": args,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_content() {
        let output = executor().execute("nope", json!({})).await;
        assert!(output.is_error);
        assert!(output.text.contains("UnknownTool"));
        assert!(output.text.contains("upper"));
    }

    #[tokio::test]
    async fn test_batch_keeps_call_order() {
        let executor = executor();
        let calls = vec![
            call("c1", "upper", json!({"text": "first"})),
            call("c2", "missing", json!({})),
            call("c3", "upper", json!({})),
        ];

        let responses = executor.execute_tool_calls(&calls).await;
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].call_id, "c1");
        assert_eq!(responses[0].content, "FIRST");
        assert_eq!(responses[1].call_id, "c2");
        assert!(responses[1].content.contains("UnknownTool"));
        assert!(responses[2].content.starts_with("error: InvalidArgument"));
    }
}
