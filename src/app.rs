use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{AgentHost, GenaiAgentHost};
use crate::cli::{Config, Mode};
use crate::diagnostics::{DotnetFormatRunner, Runner};
use crate::logging::{log_error, log_info, log_warn};
use crate::prompt::load_system_prompt;
use crate::tools::{SecurityContext, ToolExecutor, ToolRegistry};

/// Process outcome the binary turns into an exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// A directly invoked tool answered with error content
    ToolError,
}

pub async fn run_app(config: Config) -> Result<Outcome> {
    let context = SecurityContext::for_directory(&config.cwd)
        .context("Failed to set up the working directory")?;
    log_info(&format!(
        "Working directory: {}",
        context.workspace_root().display()
    ));

    let runner: Arc<dyn Runner> = Arc::new(DotnetFormatRunner::new(
        config.dotnet.clone(),
        Duration::from_secs(config.runner_timeout),
    ));
    let registry = build_registry(runner, &config);
    let executor = ToolExecutor::new(registry, context);

    match &config.mode {
        Mode::ListTools => {
            print!("{}", describe_tools(executor.registry()));
            Ok(Outcome::Success)
        }
        Mode::Invoke { tool, args } => invoke_tool(&executor, tool, args).await,
        Mode::Agent { query } => {
            let mut host = GenaiAgentHost::new(config.model.clone(), config.max_turns);
            run_agent(&mut host, &executor, &config, query).await?;
            Ok(Outcome::Success)
        }
    }
}

pub fn build_registry(runner: Arc<dyn Runner>, config: &Config) -> ToolRegistry {
    let mut registry = ToolRegistry::with_diagnostics(runner, config.max_locations);
    for name in &config.tool_disable {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if registry.unregister(name) {
            log_info(&format!("Disabled tool: {}", name));
        } else {
            log_warn(&format!("Cannot disable unknown tool: {}", name));
        }
    }
    registry
}

/// Human-readable listing of every registered tool and its schema
pub fn describe_tools(registry: &ToolRegistry) -> String {
    let mut out = String::new();
    for tool in registry.iter() {
        out.push_str(&format!("{}\n  {}\n", tool.name(), tool.description()));
        let schema = serde_json::to_string_pretty(&tool.schema()).unwrap_or_default();
        for line in schema.lines() {
            out.push_str(&format!("  {}\n", line));
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str("No tools enabled\n");
    }
    out
}

async fn invoke_tool(executor: &ToolExecutor, tool: &str, args: &str) -> Result<Outcome> {
    // Keep the raw text as a string value if it is not JSON, the tool decides
    let args = serde_json::from_str(args)
        .unwrap_or_else(|_| serde_json::Value::String(args.to_string()));

    let output = executor.execute(tool, args).await;
    println!("{}", output.text);

    Ok(if output.is_error {
        Outcome::ToolError
    } else {
        Outcome::Success
    })
}

pub async fn run_agent(
    host: &mut dyn AgentHost,
    executor: &ToolExecutor,
    config: &Config,
    query: &str,
) -> Result<()> {
    if executor.registry().is_empty() {
        log_warn("All tools are disabled, the model can only answer from its own knowledge");
    }

    let system_prompt = load_system_prompt(config.system_prompt.as_deref())?;
    log_info(&format!(
        "Running agent with model {} ({} character system prompt)",
        host.model_name(),
        system_prompt.len()
    ));

    let reply = host
        .run(&system_prompt, query, executor)
        .await
        .inspect_err(|e| log_error(&format!("Agent run failed: {:#}", e)))?;

    for text in &reply.texts {
        println!("{}", text);
    }

    if reply.hit_turn_limit {
        eprintln!(
            "\n[Stopped after {} turns with tool calls pending; raise --max-turns to allow more]",
            reply.turns
        );
    }
    eprintln!(
        "\n[Tokens: {} in {} turn(s)]",
        reply.usage.format_short(),
        reply.turns
    );
    Ok(())
}
