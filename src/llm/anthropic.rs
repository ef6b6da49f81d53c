//! Anthropic Client
//!
//! LLM client implementation for the Anthropic messages API.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::client::{LlmClient, LlmReply, ToolDefinition};
use super::conversation::{ConversationThread, Turn};

/// Default Anthropic model
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Anthropic Claude API client
#[derive(Clone)]
pub struct AnthropicClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
    timeout: Duration,
}

impl AnthropicClient {
    /// Create a new Anthropic client with the given API key
    pub fn new(api_key: String) -> Self {
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self {
            api_key,
            client: reqwest::Client::new(),
            model,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create with a specific model
    pub fn with_model(api_key: String, model: &str) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            model: model.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key))
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Render the thread into messages-API objects. System turns are carried
    /// separately; tool results become `tool_result` blocks on a user turn.
    fn wire_messages(thread: &ConversationThread) -> Vec<serde_json::Value> {
        thread
            .turns()
            .iter()
            .filter_map(|turn| match turn {
                Turn::System(_) => None,
                Turn::User(content) => {
                    Some(serde_json::json!({"role": "user", "content": content}))
                }
                Turn::Assistant { text, tool_call } => {
                    let mut blocks = Vec::new();
                    if let Some(text) = text {
                        blocks.push(serde_json::json!({"type": "text", "text": text}));
                    }
                    if let Some(call) = tool_call {
                        blocks.push(serde_json::json!({
                            "type": "tool_use",
                            "id": &call.id,
                            "name": &call.name,
                            "input": &call.arguments,
                        }));
                    }
                    Some(serde_json::json!({"role": "assistant", "content": blocks}))
                }
                Turn::ToolResult {
                    call_id, content, ..
                } => Some(serde_json::json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": call_id,
                        "content": content,
                    }]
                })),
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn call_tool(
        &self,
        thread: &ConversationThread,
        tool: &ToolDefinition,
    ) -> Result<LlmReply> {
        let mut body = serde_json::json!({
            "model": &self.model,
            "max_tokens": 4096,
            "messages": Self::wire_messages(thread),
            "tools": [{
                "name": &tool.name,
                "description": &tool.description,
                "input_schema": &tool.parameters,
            }],
            "tool_choice": {"type": "tool", "name": &tool.name},
        });
        if let Some(system) = thread.system_text() {
            body["system"] = serde_json::Value::String(system);
        }

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .timeout(self.timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic API error {}: {}", status, body));
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            kind: String,
            text: Option<String>,
            id: Option<String>,
            name: Option<String>,
            input: Option<serde_json::Value>,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            content: Vec<ContentBlock>,
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse Anthropic response: {}", e))?;

        for block in &api_response.content {
            if block.kind == "tool_use" {
                let (id, name, input) = match (&block.id, &block.name, &block.input) {
                    (Some(id), Some(name), Some(input)) => (id, name, input),
                    _ => return Err(anyhow!("Malformed tool_use block from Anthropic")),
                };
                tracing::debug!(tool = %name, "Anthropic tool call received");
                return Ok(LlmReply::ToolInvocation {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: input.clone(),
                });
            }
        }

        let text: String = api_response
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err(anyhow!("Empty response from Anthropic"));
        }
        Ok(LlmReply::PlainText(text))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "Anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model() {
        let client = AnthropicClient::with_model("test-key".to_string(), "claude-3-opus");
        assert_eq!(client.model_name(), "claude-3-opus");
        assert_eq!(client.provider_name(), "Anthropic");
    }

    #[test]
    fn test_wire_messages_excludes_system() {
        let mut thread = ConversationThread::seeded("system prompt");
        thread.push_user("pick one");
        thread.push_tool_result("toolu_1", "select_best_item", "Product selection successful.");

        let messages = AnthropicClient::wire_messages(&thread);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["content"][0]["type"], "tool_result");
        assert_eq!(messages[1]["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(thread.system_text().as_deref(), Some("system prompt"));
    }
}
