//! LLM Layer
//!
//! Provider-agnostic tool-calling clients and conversation state. The rest of
//! the crate depends only on the [`LlmClient`] trait and the tagged
//! [`LlmReply`] shape; provider wire formats are decoded at the client
//! boundary.

pub mod anthropic;
pub mod backend;
pub mod client;
pub mod conversation;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use backend::{create_llm_client, AgentBackend};
pub use client::{LlmClient, LlmReply, ToolDefinition};
pub use conversation::{ConversationThread, ToolCall, Turn};
pub use openai::OpenAiClient;
