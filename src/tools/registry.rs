use async_trait::async_trait;
use genai::chat::Tool;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::diagnostics::ToolOutput;

use super::security::SecurityContext;

/// A tool the model can call.
///
/// `execute` never fails: problems are returned as error content so the
/// model can read them and adjust its arguments.
#[async_trait]
pub trait TdaTool: Send + Sync {
    /// Tool name (e.g., "extract_style_diagnostics")
    fn name(&self) -> &str;

    /// Human-readable description for the LLM
    fn description(&self) -> &str;

    /// JSON Schema for parameters (JSON Schema Draft 7)
    fn schema(&self) -> Value;

    /// Execute the tool with the raw arguments the model sent
    async fn execute(&self, args: Value, context: &SecurityContext) -> ToolOutput;

    fn to_genai_tool(&self) -> Tool {
        Tool::new(self.name())
            .with_description(self.description())
            .with_schema(self.schema())
    }
}

/// Registry of available tools, keyed and listed by name.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn TdaTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Box<dyn TdaTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Remove a tool by name, returning whether it was registered
    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn TdaTool> {
        self.tools.get(name).map(|b| b.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn TdaTool> {
        self.tools.values().map(|b| b.as_ref())
    }

    /// Convert all registered tools to genai::Tool format
    pub fn to_genai_tools(&self) -> Vec<Tool> {
        self.iter().map(|tool| tool.to_genai_tool()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
