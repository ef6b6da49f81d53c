//! OpenAI Client
//!
//! LLM client implementation for the OpenAI chat-completions API.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::client::{LlmClient, LlmReply, ToolDefinition};
use super::conversation::{ConversationThread, Turn};

/// Default OpenAI model
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// Create a new OpenAI client with the given API key
    pub fn new(api_key: String) -> Self {
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
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
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key))
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Render the thread into chat-completions message objects.
    fn wire_messages(thread: &ConversationThread) -> Vec<serde_json::Value> {
        thread
            .turns()
            .iter()
            .map(|turn| match turn {
                Turn::System(content) => {
                    serde_json::json!({"role": "system", "content": content})
                }
                Turn::User(content) => serde_json::json!({"role": "user", "content": content}),
                Turn::Assistant { text, tool_call } => {
                    let mut message = serde_json::json!({"role": "assistant", "content": text});
                    if let Some(call) = tool_call {
                        // OpenAI carries tool arguments as a JSON string.
                        message["tool_calls"] = serde_json::json!([{
                            "id": &call.id,
                            "type": "function",
                            "function": {
                                "name": &call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        }]);
                    }
                    message
                }
                Turn::ToolResult {
                    call_id, content, ..
                } => serde_json::json!({
                    "role": "tool",
                    "tool_call_id": call_id,
                    "content": content,
                }),
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn call_tool(
        &self,
        thread: &ConversationThread,
        tool: &ToolDefinition,
    ) -> Result<LlmReply> {
        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "model": &self.model,
                "messages": Self::wire_messages(thread),
                "temperature": 0.0,
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": &tool.name,
                        "description": &tool.description,
                        "parameters": &tool.parameters,
                        "strict": true,
                    }
                }],
                "tool_choice": {"type": "function", "function": {"name": &tool.name}},
                "parallel_tool_calls": false,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {}: {}", status, body));
        }

        #[derive(Deserialize)]
        struct FunctionCall {
            name: String,
            arguments: String, // OpenAI returns arguments as a JSON string
        }
        #[derive(Deserialize)]
        struct WireToolCall {
            id: String,
            function: FunctionCall,
        }
        #[derive(Deserialize)]
        struct Message {
            content: Option<String>,
            refusal: Option<String>,
            tool_calls: Option<Vec<WireToolCall>>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse OpenAI response: {}", e))?;
        let message = api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| anyhow!("OpenAI returned no choices"))?;

        if let Some(refusal) = message.refusal {
            return Ok(LlmReply::Refusal(refusal));
        }
        if let Some(call) = message.tool_calls.and_then(|calls| calls.into_iter().next()) {
            let arguments: serde_json::Value = serde_json::from_str(&call.function.arguments)
                .map_err(|e| anyhow!("Failed to parse tool call arguments: {}", e))?;
            tracing::debug!(tool = %call.function.name, "OpenAI tool call received");
            return Ok(LlmReply::ToolInvocation {
                id: call.id,
                name: call.function.name,
                arguments,
            });
        }
        Ok(LlmReply::PlainText(message.content.unwrap_or_default()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::conversation::ToolCall;

    #[test]
    fn test_with_model() {
        let client = OpenAiClient::with_model("test-key".to_string(), "gpt-4o");
        assert_eq!(client.model_name(), "gpt-4o");
        assert_eq!(client.provider_name(), "OpenAI");
    }

    #[test]
    fn test_wire_messages_shapes() {
        let mut thread = ConversationThread::seeded("system prompt");
        thread.push_user("pick one");
        thread.push_assistant_tool_call(ToolCall {
            id: "call_1".into(),
            name: "select_best_item".into(),
            arguments: serde_json::json!({"itemId": 42, "quantity": 1, "rationale": "fits"}),
        });
        thread.push_tool_result("call_1", "select_best_item", "Product selection successful.");

        let messages = OpenAiClient::wire_messages(&thread);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["tool_calls"][0]["id"], "call_1");
        // Arguments must be a JSON-encoded string on the wire.
        assert!(messages[2]["tool_calls"][0]["function"]["arguments"].is_string());
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
    }
}
