use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::logging::{log_debug, log_info};

/// System prompt shipped with the binary
const BUNDLED_PROMPT: &str = include_str!("../prompts/system_prompt.prompty");

/// Load the system prompt: the given file, or the bundled one.
pub fn load_system_prompt(path: Option<&Path>) -> Result<String> {
    let raw = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read system prompt: {}", path.display()))?;
            log_info(&format!(
                "Loaded system prompt with {} characters from: {}",
                content.len(),
                path.display()
            ));
            content
        }
        None => {
            log_debug("Using bundled system prompt");
            BUNDLED_PROMPT.to_string()
        }
    };

    let prompt = prompt_body(&raw);
    if prompt.is_empty() {
        return Err(anyhow::anyhow!("System prompt is empty"));
    }
    Ok(prompt)
}

/// Extract the prompt text from a prompty document.
///
/// Drops the `---` front matter and a leading `system:` marker, then collapses
/// all whitespace so the prompt is a single line.
pub fn prompt_body(document: &str) -> String {
    let body = strip_front_matter(document).trim_start();
    let body = body.strip_prefix("system:").unwrap_or(body);
    body.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_front_matter(document: &str) -> &str {
    let trimmed = document.trim_start();
    let Some(rest) = trimmed.strip_prefix("---") else {
        return document;
    };
    // Closing fence must sit on its own line
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if offset > line.len() && line.trim_end() == "---" {
            return &rest[offset..];
        }
    }
    document
}
