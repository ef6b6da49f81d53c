//! Conversation threads
//!
//! Ordered dialogue turns shared with the oracle. A thread seeded before
//! fan-out is cloned per shopping-list entry, so concurrent resolutions never
//! share mutable dialogue state.

use serde::{Deserialize, Serialize};

/// A tool call the model made, recorded on the assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back in the tool-result turn.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One dialogue turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Turn {
    System(String),
    User(String),
    Assistant {
        text: Option<String>,
        tool_call: Option<ToolCall>,
    },
    /// Result of executing a tool call, fed back to keep the model's view of
    /// the exchange consistent across a retry chain.
    ToolResult {
        call_id: String,
        tool_name: String,
        content: String,
    },
}

/// Ordered sequence of dialogue turns, exclusively owned by one resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    turns: Vec<Turn>,
}

impl ConversationThread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thread seeded with a system prompt.
    pub fn seeded(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::System(system_prompt.into())],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::User(content.into()));
    }

    pub fn push_assistant_tool_call(&mut self, call: ToolCall) {
        self.turns.push(Turn::Assistant {
            text: None,
            tool_call: Some(call),
        });
    }

    pub fn push_tool_result(
        &mut self,
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) {
        self.turns.push(Turn::ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Concatenated system-turn content, for providers that carry the system
    /// prompt outside the message list.
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .turns
            .iter()
            .filter_map(|t| match t {
                Turn::System(content) => Some(content.as_str()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_thread() {
        let thread = ConversationThread::seeded("You are a shopping agent.");
        assert_eq!(thread.len(), 1);
        assert_eq!(
            thread.system_text().as_deref(),
            Some("You are a shopping agent.")
        );
    }

    #[test]
    fn test_clones_diverge_independently() {
        let seed = ConversationThread::seeded("system");
        let mut a = seed.clone();
        let mut b = seed.clone();

        a.push_user("looking for flour");
        b.push_user("looking for sugar");
        b.push_tool_result("call_1", "select_best_item", "Product selection successful.");

        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 3);
        assert_ne!(a, b);
        assert_eq!(seed.len(), 1);
    }
}
