//! recipe-cart
//!
//! Resolves a shopping list (ingredient / search term / quantity triples)
//! into a Walmart cart: each entry is resolved concurrently by searching the
//! affiliate product catalog, asking an LLM-backed selection oracle to pick
//! the best candidate (or refine the search term when a search comes up
//! empty), retrying under a bounded budget, and aggregating successes into a
//! cart plus a checkout URL.
//!
//! ## Backend Selection
//!
//! Set the `AGENT_BACKEND` environment variable:
//! - `openai` (default): OpenAI chat-completions API
//! - `anthropic`: Anthropic messages API

pub mod cart;
pub mod config;
pub mod error;
pub mod llm;
pub mod oracle;
pub mod resolver;
pub mod walmart;

// Re-exports for convenience
pub use cart::{encode_cart_url, Cart, CartLine};
pub use config::Config;
pub use error::ResolveError;
pub use llm::{create_llm_client, AgentBackend, ConversationThread, LlmClient, LlmReply};
pub use oracle::SelectionOracle;
pub use resolver::{
    CartResult, ItemOutcome, ItemResolver, ShoppingListEntry, ShoppingListResolver,
};
pub use walmart::{AffiliateClient, CandidateProduct, ProductSearch};
