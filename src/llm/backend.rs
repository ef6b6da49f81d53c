//! Backend Selection
//!
//! Enum for selecting between LLM providers (OpenAI, Anthropic).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::anthropic::AnthropicClient;
use super::client::LlmClient;
use super::openai::OpenAiClient;

/// LLM backend provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentBackend {
    /// OpenAI GPT (default)
    #[default]
    OpenAi,
    /// Anthropic Claude
    Anthropic,
}

impl AgentBackend {
    /// Create from AGENT_BACKEND environment variable
    ///
    /// Valid values: "openai", "gpt", "anthropic", "claude"
    /// Defaults to OpenAI if not set
    pub fn from_env() -> Result<Self> {
        let value = std::env::var("AGENT_BACKEND").unwrap_or_else(|_| "openai".to_string());
        value
            .parse()
            .map_err(|e: ParseBackendError| anyhow!("{}", e))
    }

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            AgentBackend::OpenAi => "OpenAI",
            AgentBackend::Anthropic => "Anthropic",
        }
    }
}

/// Error type for parsing AgentBackend
#[derive(Debug)]
pub struct ParseBackendError(String);

impl std::fmt::Display for ParseBackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseBackendError {}

impl FromStr for AgentBackend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "gpt" => Ok(AgentBackend::OpenAi),
            "anthropic" | "claude" => Ok(AgentBackend::Anthropic),
            other => Err(ParseBackendError(format!(
                "Unknown AGENT_BACKEND '{}'. Valid values: openai, gpt, anthropic, claude",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AgentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Build the configured LLM client from environment credentials.
pub fn create_llm_client(backend: AgentBackend, timeout: Duration) -> Result<Arc<dyn LlmClient>> {
    match backend {
        AgentBackend::OpenAi => Ok(Arc::new(OpenAiClient::from_env()?.with_timeout(timeout))),
        AgentBackend::Anthropic => {
            Ok(Arc::new(AnthropicClient::from_env()?.with_timeout(timeout)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(
            "openai".parse::<AgentBackend>().unwrap(),
            AgentBackend::OpenAi
        );
        assert_eq!("gpt".parse::<AgentBackend>().unwrap(), AgentBackend::OpenAi);
        assert_eq!(
            "anthropic".parse::<AgentBackend>().unwrap(),
            AgentBackend::Anthropic
        );
        assert_eq!(
            "claude".parse::<AgentBackend>().unwrap(),
            AgentBackend::Anthropic
        );
        assert!("invalid".parse::<AgentBackend>().is_err());
    }

    #[test]
    fn test_default() {
        assert_eq!(AgentBackend::default(), AgentBackend::OpenAi);
    }
}
