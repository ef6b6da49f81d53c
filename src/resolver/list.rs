//! Shopping List Resolver
//!
//! Fan-out/fan-in coordinator: one item-resolver task per entry, started
//! together and joined together. Result ordering matches input ordering
//! regardless of completion order, and a panic in one task becomes that
//! entry's skipped outcome rather than aborting its siblings.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::cart::{encode_cart_url, Cart, CartLine};
use crate::config::Config;
use crate::llm::{create_llm_client, AgentBackend, ConversationThread};
use crate::oracle::{SelectionOracle, SYSTEM_PROMPT};
use crate::resolver::{ItemOutcome, ItemResolver, ShoppingListEntry};
use crate::walmart::{AffiliateClient, StaticHeaders};

/// Outcome of resolving a whole shopping list.
#[derive(Debug, Clone, Serialize)]
pub struct CartResult {
    /// Retailer cart-import URL for the resolved lines.
    pub url: String,
    /// Resolved lines, in shopping-list order.
    pub items: Vec<CartLine>,
    /// Ingredient names of entries that could not be resolved, in
    /// shopping-list order.
    pub skipped: Vec<String>,
    /// Human-readable one-liner for logs and UIs.
    pub summary: String,
}

/// Concurrent resolver for a full shopping list.
pub struct ShoppingListResolver {
    item_resolver: Arc<ItemResolver>,
    cart_base_url: String,
}

impl ShoppingListResolver {
    pub fn new(item_resolver: ItemResolver, cart_base_url: impl Into<String>) -> Self {
        Self {
            item_resolver: Arc::new(item_resolver),
            cart_base_url: cart_base_url.into(),
        }
    }

    /// Wire up the real search client and the configured LLM backend from
    /// environment configuration.
    pub fn from_env() -> Result<Self> {
        let config = Config::from_env();
        let backend = AgentBackend::from_env()?;
        let llm = create_llm_client(backend, config.request_timeout)?;
        tracing::info!(backend = %backend, model = llm.model_name(), "LLM backend selected");
        let headers = Arc::new(StaticHeaders::from_config(&config));
        let search = Arc::new(AffiliateClient::new(&config, headers));
        let item_resolver = ItemResolver::new(search, SelectionOracle::new(llm), config.max_retries);
        Ok(Self::new(item_resolver, config.cart_base_url))
    }

    /// Resolve every entry concurrently and partition the outcomes.
    ///
    /// Each entry gets its own clone of `seed_context`, so no dialogue state
    /// is shared across tasks. Skipped entries are reported by the ingredient
    /// name from the original entry, not any oracle-rewritten term.
    pub async fn resolve_list(
        &self,
        entries: &[ShoppingListEntry],
        seed_context: &ConversationThread,
        bypass_retry: bool,
    ) -> (Cart, Vec<String>) {
        let mut handles = Vec::with_capacity(entries.len());
        for entry in entries {
            let resolver = Arc::clone(&self.item_resolver);
            let thread = seed_context.clone();
            let entry = entry.clone();
            handles.push(tokio::spawn(async move {
                resolver.resolve(entry, thread, bypass_retry).await
            }));
        }

        let joined = futures::future::join_all(handles).await;

        let mut cart = Cart::new();
        let mut skipped = Vec::new();
        for (idx, joined_outcome) in joined.into_iter().enumerate() {
            let outcome = match joined_outcome {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    tracing::error!(
                        ingredient = %entries[idx].ingredient,
                        error = %join_err,
                        "item resolution task aborted"
                    );
                    ItemOutcome::Skipped {
                        reason: format!("resolution task aborted: {join_err}"),
                    }
                }
            };
            match outcome {
                ItemOutcome::Resolved(line) => cart.push(line),
                ItemOutcome::Skipped { reason } => {
                    tracing::warn!(ingredient = %entries[idx].ingredient, reason, "item skipped");
                    skipped.push(entries[idx].ingredient.clone());
                }
            }
        }
        (cart, skipped)
    }

    /// Outer entrypoint consumed by the CLI and service layers: resolve the
    /// list and wrap cart, checkout URL, skip report, and summary together.
    pub async fn resolve_to_cart(
        &self,
        entries: &[ShoppingListEntry],
        seed_context: Option<&ConversationThread>,
        bypass_retry: bool,
    ) -> CartResult {
        let default_seed;
        let seed = match seed_context {
            Some(seed) => seed,
            None => {
                default_seed = ConversationThread::seeded(SYSTEM_PROMPT);
                &default_seed
            }
        };
        let (cart, skipped) = self.resolve_list(entries, seed, bypass_retry).await;
        let url = encode_cart_url(&self.cart_base_url, &cart);
        let summary = if skipped.is_empty() {
            format!("Resolved all {} items.", cart.len())
        } else {
            format!(
                "Resolved {} of {} items; skipped: {}.",
                cart.len(),
                entries.len(),
                skipped.join(", ")
            )
        };
        CartResult {
            url,
            items: cart.into_iter().collect(),
            skipped,
            summary,
        }
    }
}
