//! Selection Oracle
//!
//! Typed layer over the LLM tool-call protocol. Exposes the two capabilities
//! the item resolver needs: pick the best product from an offered candidate
//! list, or propose a refined search term when a search came up empty. Every
//! call appends its turns to the caller's conversation thread so the model
//! keeps the failure context across a retry chain.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::ResolveError;
use crate::llm::{ConversationThread, LlmClient, LlmReply, ToolCall, ToolDefinition};
use crate::resolver::ShoppingListEntry;
use crate::walmart::OfferedCandidate;

pub const SELECT_BEST_ITEM: &str = "select_best_item";
pub const RETRY_PRODUCT_SEARCH: &str = "retry_product_search";

/// System prompt seeding a resolution conversation.
pub const SYSTEM_PROMPT: &str = "You are an agent in charge of finding items from an online \
     shopping website to put in the user's cart based on a recipe.";

fn select_best_item_tool() -> ToolDefinition {
    ToolDefinition {
        name: SELECT_BEST_ITEM.to_string(),
        description: "Output the product that best matches the corresponding ingredient in the recipe."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "rationale": {
                    "type": "string",
                    "description": "Brief 1-2 sentence rationale for selecting this product and its quantity."
                },
                "itemId": {
                    "type": "integer",
                    "description": "'itemId' of the selected product."
                },
                "quantity": {
                    "type": "integer",
                    "description": "Quantity to order of the selected product."
                }
            },
            "required": ["rationale", "itemId", "quantity"],
            "additionalProperties": false
        }),
    }
}

fn retry_product_search_tool() -> ToolDefinition {
    ToolDefinition {
        name: RETRY_PRODUCT_SEARCH.to_string(),
        description: "Output a search term for an ingredient that didn't yield usable search results the first time."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "ingredient": {
                    "type": "string",
                    "description": "A single ingredient, quoted from the recipe."
                },
                "product": {
                    "type": "string",
                    "description": "Search term for what *product* one would need to buy from the store to get this ingredient. Omit adjectives related to prep work."
                },
                "quantity": {
                    "type": "string",
                    "description": "Quantity of the product. Include units if applicable."
                }
            },
            "required": ["ingredient", "product", "quantity"],
            "additionalProperties": false
        }),
    }
}

/// A selection the oracle proposed, not yet validated against the offered
/// candidate ids.
#[derive(Debug, Clone)]
pub struct SelectionProposal {
    /// Call id to echo back in the tool-result turn.
    pub call_id: String,
    pub item_id: i64,
    pub quantity: i64,
    pub rationale: String,
}

/// A replacement shopping-list entry after a failed search.
#[derive(Debug, Clone)]
pub struct RefinedEntry {
    pub entry: ShoppingListEntry,
}

/// LLM-backed decision service for product selection.
#[derive(Clone)]
pub struct SelectionOracle {
    llm: Arc<dyn LlmClient>,
}

impl SelectionOracle {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Force a call of `tool`, returning the invocation or the appropriate
    /// protocol error. The assistant turn is recorded on the thread.
    async fn invoke_tool(
        &self,
        thread: &mut ConversationThread,
        tool: &ToolDefinition,
    ) -> Result<ToolCall, ResolveError> {
        let reply = self
            .llm
            .call_tool(thread, tool)
            .await
            .map_err(|e| ResolveError::Transport(e.to_string()))?;
        match reply {
            LlmReply::ToolInvocation {
                id,
                name,
                arguments,
            } if name == tool.name => {
                let call = ToolCall {
                    id,
                    name,
                    arguments,
                };
                thread.push_assistant_tool_call(call.clone());
                Ok(call)
            }
            LlmReply::ToolInvocation { name, .. } => Err(ResolveError::ProtocolViolation(format!(
                "expected tool '{}', got '{}'",
                tool.name, name
            ))),
            LlmReply::Refusal(message) => Err(ResolveError::ProtocolViolation(format!(
                "oracle refused: {message}"
            ))),
            LlmReply::PlainText(_) => Err(ResolveError::ProtocolViolation(format!(
                "expected a call of tool '{}', got plain text",
                tool.name
            ))),
        }
    }

    /// Ask the oracle to pick the best product for `entry` from `offered`.
    ///
    /// The caller validates the proposal and is responsible for appending the
    /// matching tool-result turn (success or corrective) via
    /// [`ConversationThread::push_tool_result`].
    pub async fn select_best_item(
        &self,
        thread: &mut ConversationThread,
        entry: &ShoppingListEntry,
        offered: &[OfferedCandidate<'_>],
    ) -> Result<SelectionProposal, ResolveError> {
        let listing = serde_yaml::to_string(offered)
            .map_err(|e| ResolveError::Transport(format!("candidate listing: {e}")))?;
        let prompt = format!(
            "Requested item: {}\nQuantity: {}\n\nPlease select the product from the list below \
             that best matches the requested item description. {}\n",
            entry.product_search_term, entry.quantity, listing
        );
        thread.push_user(prompt);

        let tool = select_best_item_tool();
        let call = self.invoke_tool(thread, &tool).await?;

        #[derive(Deserialize)]
        struct SelectionArgs {
            rationale: String,
            #[serde(rename = "itemId")]
            item_id: i64,
            quantity: i64,
        }

        let args: SelectionArgs = serde_json::from_value(call.arguments).map_err(|e| {
            ResolveError::ProtocolViolation(format!("malformed select_best_item arguments: {e}"))
        })?;
        Ok(SelectionProposal {
            call_id: call.id,
            item_id: args.item_id,
            quantity: args.quantity,
            rationale: args.rationale,
        })
    }

    /// Ask the oracle for a replacement search term after a failed search.
    /// Acknowledges its own tool call on the thread.
    pub async fn refine_search_term(
        &self,
        thread: &mut ConversationThread,
    ) -> Result<RefinedEntry, ResolveError> {
        let tool = retry_product_search_tool();
        let call = self.invoke_tool(thread, &tool).await?;

        #[derive(Deserialize)]
        struct RefineArgs {
            ingredient: String,
            product: String,
            quantity: String,
        }

        let args: RefineArgs = serde_json::from_value(call.arguments).map_err(|e| {
            ResolveError::ProtocolViolation(format!(
                "malformed retry_product_search arguments: {e}"
            ))
        })?;
        thread.push_tool_result(call.id, RETRY_PRODUCT_SEARCH, "Product search successful.");
        Ok(RefinedEntry {
            entry: ShoppingListEntry {
                ingredient: args.ingredient,
                product_search_term: args.product,
                quantity: args.quantity,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result as AnyResult;
    use async_trait::async_trait;

    /// Fake client returning a queued reply.
    struct ScriptedLlm {
        reply: std::sync::Mutex<Option<LlmReply>>,
    }

    impl ScriptedLlm {
        fn new(reply: LlmReply) -> Self {
            Self {
                reply: std::sync::Mutex::new(Some(reply)),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn call_tool(
            &self,
            _thread: &ConversationThread,
            _tool: &ToolDefinition,
        ) -> AnyResult<LlmReply> {
            Ok(self
                .reply
                .lock()
                .unwrap()
                .take()
                .expect("reply already consumed"))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }

        fn provider_name(&self) -> &str {
            "test"
        }
    }

    fn entry() -> ShoppingListEntry {
        ShoppingListEntry {
            ingredient: "flour".into(),
            product_search_term: "all-purpose flour".into(),
            quantity: "1 cup".into(),
        }
    }

    #[tokio::test]
    async fn test_select_best_item_parses_and_records_turns() {
        let oracle = SelectionOracle::new(Arc::new(ScriptedLlm::new(LlmReply::ToolInvocation {
            id: "call_9".into(),
            name: SELECT_BEST_ITEM.into(),
            arguments: serde_json::json!({"itemId": 42, "quantity": 2, "rationale": "cheapest match"}),
        })));
        let mut thread = ConversationThread::seeded(SYSTEM_PROMPT);
        let proposal = oracle
            .select_best_item(&mut thread, &entry(), &[])
            .await
            .unwrap();
        assert_eq!(proposal.item_id, 42);
        assert_eq!(proposal.quantity, 2);
        assert_eq!(proposal.call_id, "call_9");
        // system + user prompt + assistant tool call
        assert_eq!(thread.len(), 3);
    }

    #[tokio::test]
    async fn test_wrong_tool_name_is_protocol_violation() {
        let oracle = SelectionOracle::new(Arc::new(ScriptedLlm::new(LlmReply::ToolInvocation {
            id: "call_1".into(),
            name: "some_other_tool".into(),
            arguments: serde_json::json!({}),
        })));
        let mut thread = ConversationThread::new();
        let err = oracle.refine_search_term(&mut thread).await.unwrap_err();
        assert!(matches!(err, ResolveError::ProtocolViolation(_)));
        assert!(!err.is_retriable());
    }

    #[tokio::test]
    async fn test_plain_text_is_protocol_violation() {
        let oracle = SelectionOracle::new(Arc::new(ScriptedLlm::new(LlmReply::PlainText(
            "I think the flour looks good".into(),
        ))));
        let mut thread = ConversationThread::new();
        let err = oracle
            .select_best_item(&mut thread, &entry(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ProtocolViolation(_)));
    }

    #[tokio::test]
    async fn test_missing_fields_are_protocol_violation() {
        let oracle = SelectionOracle::new(Arc::new(ScriptedLlm::new(LlmReply::ToolInvocation {
            id: "call_2".into(),
            name: SELECT_BEST_ITEM.into(),
            arguments: serde_json::json!({"itemId": 42}),
        })));
        let mut thread = ConversationThread::new();
        let err = oracle
            .select_best_item(&mut thread, &entry(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ProtocolViolation(_)));
    }

    #[tokio::test]
    async fn test_refine_appends_ack_and_returns_entry() {
        let oracle = SelectionOracle::new(Arc::new(ScriptedLlm::new(LlmReply::ToolInvocation {
            id: "call_3".into(),
            name: RETRY_PRODUCT_SEARCH.into(),
            arguments: serde_json::json!({
                "ingredient": "flour",
                "product": "white flour 5 lb",
                "quantity": "1 bag"
            }),
        })));
        let mut thread = ConversationThread::new();
        let refined = oracle.refine_search_term(&mut thread).await.unwrap();
        assert_eq!(refined.entry.product_search_term, "white flour 5 lb");
        // assistant tool call + tool result ack
        assert_eq!(thread.len(), 2);
    }
}
