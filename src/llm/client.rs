//! LLM Client Trait
//!
//! Unified tool-calling interface for LLM providers (OpenAI, Anthropic).
//! Every provider decodes its wire format into the single tagged [`LlmReply`]
//! shape at its own boundary, so callers never probe provider-specific
//! response structure.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::conversation::ConversationThread;

/// Tool/function definition for structured output
///
/// Used with [`LlmClient::call_tool`] to force the LLM to return structured
/// JSON.
/// - OpenAI: maps to the `tools` array with `tool_choice`
/// - Anthropic: maps to `tools` with a forced `tool_choice`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (e.g., "select_best_item")
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the tool's parameters
    pub parameters: serde_json::Value,
}

/// Uniform reply shape regardless of backing provider.
#[derive(Debug, Clone)]
pub enum LlmReply {
    /// The model invoked a tool with structured arguments.
    ToolInvocation {
        /// Provider-assigned call id, to echo in the tool-result turn.
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    /// The model answered in prose instead of calling the offered tool.
    PlainText(String),
    /// The model declined to answer.
    Refusal(String),
}

/// Unified LLM client interface for both OpenAI and Anthropic
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Continue a conversation, forcing the model to call `tool`.
    ///
    /// Transport and API errors surface as `Err`; a model response that is
    /// not a tool call still returns `Ok` with the appropriate [`LlmReply`]
    /// variant, for the caller to treat as a protocol violation.
    async fn call_tool(
        &self,
        thread: &ConversationThread,
        tool: &ToolDefinition,
    ) -> Result<LlmReply>;

    /// Get the model name for logging
    fn model_name(&self) -> &str;

    /// Get the provider name for logging
    fn provider_name(&self) -> &str;
}
