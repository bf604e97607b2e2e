//! The conversational side: something that talks to a model and lets it call
//! our tools until it has an answer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest, ChatResponse};

use crate::logging::{log_debug, log_info, log_trace, log_warn};
use crate::tools::ToolExecutor;

/// Token counts summed over every model round trip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl TokenUsage {
    /// Add one round trip. A count missing from any round trip makes the sum
    /// unknown; a missing total is derived from prompt and completion first.
    pub fn add(&mut self, other: TokenUsage) {
        let other = other.with_derived_total();
        if *self == TokenUsage::default() {
            *self = other;
            return;
        }
        self.prompt_tokens = sum(self.prompt_tokens, other.prompt_tokens);
        self.completion_tokens = sum(self.completion_tokens, other.completion_tokens);
        self.total_tokens = sum(self.total_tokens, other.total_tokens);
    }

    fn with_derived_total(mut self) -> Self {
        if self.total_tokens.is_none()
            && let (Some(p), Some(c)) = (self.prompt_tokens, self.completion_tokens)
        {
            self.total_tokens = Some(p.saturating_add(c));
        }
        self
    }

    pub fn format_short(&self) -> String {
        match (
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
        ) {
            (Some(p), Some(c), Some(t)) => format!("{}+{}={}", p, c, t),
            (Some(p), Some(c), None) => format!("{}+{}", p, c),
            (None, None, Some(t)) => format!("{}", t),
            _ => "N/A".to_string(),
        }
    }
}

fn sum(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    Some(a?.saturating_add(b?))
}

/// Outcome of one agent run
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    /// Text blocks in the order the model produced them
    pub texts: Vec<String>,
    pub usage: TokenUsage,
    /// Model round trips used
    pub turns: usize,
    /// The model was still calling tools when the turn limit was reached
    pub hit_turn_limit: bool,
}

/// The agent runtime hosting our tools.
#[async_trait]
pub trait AgentHost: Send {
    async fn run(
        &mut self,
        system_prompt: &str,
        query: &str,
        executor: &ToolExecutor,
    ) -> Result<AgentReply>;

    /// Model name being used
    fn model_name(&self) -> &str;
}

/// [`AgentHost`] backed by the `genai` multi-provider client.
///
/// Provider and credentials come from the model name and the usual
/// environment variables (GEMINI_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY, ...).
pub struct GenaiAgentHost {
    client: Client,
    model: String,
    max_turns: usize,
}

impl GenaiAgentHost {
    pub fn new(model: impl Into<String>, max_turns: usize) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
            max_turns: max_turns.max(1),
        }
    }
}

#[async_trait]
impl AgentHost for GenaiAgentHost {
    async fn run(
        &mut self,
        system_prompt: &str,
        query: &str,
        executor: &ToolExecutor,
    ) -> Result<AgentReply> {
        let mut chat_request = ChatRequest::from_system(system_prompt)
            .append_message(ChatMessage::user(query))
            .with_tools(executor.registry().to_genai_tools());

        let mut reply = AgentReply::default();

        while reply.turns < self.max_turns {
            reply.turns += 1;
            log_info(&format!(
                "Sending turn {} to model {}",
                reply.turns, self.model
            ));

            let chat_response = self
                .client
                .exec_chat(&self.model, chat_request.clone(), None)
                .await
                .with_context(|| format!("Chat request to model '{}' failed", self.model))?;

            log_trace(&format!("Response: {:?}", chat_response));
            reply.usage.add(usage_of(&chat_response));

            if let Some(text) = chat_response.first_text()
                && !text.trim().is_empty()
            {
                reply.texts.push(text.to_string());
            }

            let tool_calls = chat_response.into_tool_calls();
            if tool_calls.is_empty() {
                log_info(&format!(
                    "Agent finished after {} turn(s), usage {}",
                    reply.turns,
                    reply.usage.format_short()
                ));
                return Ok(reply);
            }

            log_debug(&format!(
                "Model requested {} tool call(s): {:?}",
                tool_calls.len(),
                tool_calls.iter().map(|tc| &tc.fn_name).collect::<Vec<_>>()
            ));

            let responses = executor.execute_tool_calls(&tool_calls).await;
            chat_request = chat_request.append_message(tool_calls);
            for response in responses {
                chat_request = chat_request.append_message(response);
            }
        }

        Ok(stop_at_turn_limit(reply))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Keep what the model said so far and flag the reply as incomplete.
fn stop_at_turn_limit(mut reply: AgentReply) -> AgentReply {
    log_warn(&format!(
        "Agent stopped after reaching the limit of {} turns with tool calls pending",
        reply.turns
    ));
    reply.hit_turn_limit = true;
    reply
}

fn usage_of(response: &ChatResponse) -> TokenUsage {
    TokenUsage {
        prompt_tokens: response.usage.prompt_tokens.map(|t| t as u32),
        completion_tokens: response.usage.completion_tokens.map(|t| t as u32),
        total_tokens: response.usage.total_tokens.map(|t| t as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut usage = TokenUsage::default();
        assert_eq!(usage.format_short(), "N/A");

        usage.add(TokenUsage {
            prompt_tokens: Some(100),
            completion_tokens: Some(20),
            total_tokens: Some(120),
        });
        usage.add(TokenUsage {
            prompt_tokens: Some(300),
            completion_tokens: Some(40),
            total_tokens: None,
        });

        assert_eq!(usage.prompt_tokens, Some(400));
        assert_eq!(usage.completion_tokens, Some(60));
        assert_eq!(usage.total_tokens, Some(460));
        assert_eq!(usage.format_short(), "400+60=460");
    }

    #[test]
    fn test_usage_with_missing_counts_stays_consistent() {
        let mut usage = TokenUsage::default();
        usage.add(TokenUsage {
            prompt_tokens: Some(100),
            completion_tokens: Some(20),
            total_tokens: Some(120),
        });
        usage.add(TokenUsage {
            prompt_tokens: None,
            completion_tokens: Some(40),
            total_tokens: Some(90),
        });

        assert_eq!(usage.prompt_tokens, None);
        assert_eq!(usage.completion_tokens, Some(60));
        assert_eq!(usage.total_tokens, Some(210));
        assert_eq!(usage.format_short(), "N/A");

        usage.add(TokenUsage::default());
        assert_eq!(usage.total_tokens, None);
    }

    #[test]
    fn test_turn_limit_keeps_collected_texts() {
        let reply = AgentReply {
            texts: vec!["Looking at the style diagnostics first.".to_string()],
            turns: 3,
            ..Default::default()
        };

        let reply = stop_at_turn_limit(reply);
        assert!(reply.hit_turn_limit);
        assert_eq!(reply.turns, 3);
        assert_eq!(reply.texts, vec!["Looking at the style diagnostics first."]);
    }

    #[test]
    fn test_max_turns_is_at_least_one() {
        let host = GenaiAgentHost::new("gemini-2.5-flash", 0);
        assert_eq!(host.max_turns, 1);
        assert_eq!(host.model_name(), "gemini-2.5-flash");
    }
}
