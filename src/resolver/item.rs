//! Item Resolver
//!
//! Resolves exactly one shopping-list entry to exactly one outcome. The retry
//! chain is an explicit loop with a bounded attempt counter: search, select,
//! and on a recoverable failure ask the oracle for a refined search term and
//! go around again. Nothing escapes [`ItemResolver::resolve`]; the list-level
//! fan-in never sees item errors.

use std::sync::Arc;

use crate::cart::CartLine;
use crate::error::ResolveError;
use crate::llm::ConversationThread;
use crate::oracle::{SelectionOracle, SelectionProposal, SELECT_BEST_ITEM};
use crate::resolver::{ItemOutcome, ShoppingListEntry};
use crate::walmart::{filter_candidates, CandidateProduct, OfferedCandidate, ProductSearch, SELLER};

/// Cap on the candidate slice shown to the oracle. Bounds prompt size; a
/// precision/latency tradeoff rather than a correctness requirement.
pub const MAX_OFFERED_CANDIDATES: usize = 3;

/// Resolves one shopping-list entry against search + oracle.
pub struct ItemResolver {
    search: Arc<dyn ProductSearch>,
    oracle: SelectionOracle,
    max_retries: u32,
}

impl ItemResolver {
    pub fn new(search: Arc<dyn ProductSearch>, oracle: SelectionOracle, max_retries: u32) -> Self {
        Self {
            search,
            oracle,
            max_retries,
        }
    }

    /// Resolve `entry` to a cart line or a skipped outcome.
    ///
    /// `thread` is this entry's private branch of the seed conversation;
    /// `bypass_retry` fails fast to a skipped outcome on the first failure.
    /// With retries enabled, at most `max_retries + 1` searches are issued.
    pub async fn resolve(
        &self,
        entry: ShoppingListEntry,
        mut thread: ConversationThread,
        bypass_retry: bool,
    ) -> ItemOutcome {
        let mut current = entry;
        let mut attempt: u32 = 0;
        loop {
            let candidates = match self.search.search(&current.product_search_term).await {
                Ok(items) => items,
                Err(err) => {
                    // Transport and parse failures count as zero candidates.
                    tracing::warn!(
                        term = %current.product_search_term,
                        error = %err,
                        "product search failed"
                    );
                    Vec::new()
                }
            };
            let offered = filter_candidates(&candidates, MAX_OFFERED_CANDIDATES);
            if offered.is_empty() {
                let why = ResolveError::NoCandidates {
                    term: current.product_search_term.clone(),
                }
                .to_string();
                match self
                    .next_attempt(&mut thread, &current, attempt, bypass_retry, &why)
                    .await
                {
                    Ok(refined) => {
                        current = refined;
                        attempt += 1;
                        continue;
                    }
                    Err(outcome) => return outcome,
                }
            }

            let offered_views: Vec<OfferedCandidate> =
                offered.iter().map(OfferedCandidate::from).collect();
            let proposal = match self
                .oracle
                .select_best_item(&mut thread, &current, &offered_views)
                .await
            {
                Ok(proposal) => proposal,
                Err(err) if err.is_retriable() => {
                    let why = err.to_string();
                    match self
                        .next_attempt(&mut thread, &current, attempt, bypass_retry, &why)
                        .await
                    {
                        Ok(refined) => {
                            current = refined;
                            attempt += 1;
                            continue;
                        }
                        Err(outcome) => return outcome,
                    }
                }
                Err(err) => {
                    tracing::error!(
                        term = %current.product_search_term,
                        error = %err,
                        "oracle broke the selection protocol"
                    );
                    return ItemOutcome::Skipped {
                        reason: err.to_string(),
                    };
                }
            };

            match validate_proposal(&proposal, &offered) {
                Ok(quantity) => {
                    thread.push_tool_result(
                        proposal.call_id,
                        SELECT_BEST_ITEM,
                        "Product selection successful.",
                    );
                    let source = offered
                        .into_iter()
                        .find(|candidate| candidate.item_id == proposal.item_id);
                    return ItemOutcome::Resolved(CartLine {
                        item_id: proposal.item_id,
                        quantity,
                        seller: SELLER.to_string(),
                        rationale: proposal.rationale,
                        source,
                    });
                }
                Err(correction) => {
                    // Feed the failure back so the next attempt has context.
                    thread.push_tool_result(
                        proposal.call_id.clone(),
                        SELECT_BEST_ITEM,
                        correction.clone(),
                    );
                    let why = ResolveError::InvalidSelection {
                        reason: correction.clone(),
                    }
                    .to_string();
                    match self
                        .next_attempt(&mut thread, &current, attempt, bypass_retry, &why)
                        .await
                    {
                        Ok(refined) => {
                            current = refined;
                            attempt += 1;
                        }
                        Err(outcome) => return outcome,
                    }
                }
            }
        }
    }

    /// Decide whether the failed attempt gets another go. Returns the refined
    /// entry for the next loop iteration, or the terminal skipped outcome.
    async fn next_attempt(
        &self,
        thread: &mut ConversationThread,
        current: &ShoppingListEntry,
        attempt: u32,
        bypass_retry: bool,
        why: &str,
    ) -> Result<ShoppingListEntry, ItemOutcome> {
        if bypass_retry {
            tracing::info!(term = %current.product_search_term, why, "bypassing retry");
            return Err(ItemOutcome::Skipped {
                reason: format!("{why}; skipped due to bypass-retry setting"),
            });
        }
        if attempt >= self.max_retries {
            let reason = ResolveError::RetryBudgetExhausted {
                term: current.product_search_term.clone(),
                attempts: attempt + 1,
            }
            .to_string();
            tracing::info!(term = %current.product_search_term, attempts = attempt + 1, "retry budget exhausted");
            return Err(ItemOutcome::Skipped { reason });
        }
        tracing::debug!(
            term = %current.product_search_term,
            retry = attempt + 1,
            why,
            "asking oracle for a refined search term"
        );
        match self.oracle.refine_search_term(thread).await {
            Ok(refined) => Ok(refined.entry),
            Err(err) => Err(ItemOutcome::Skipped {
                reason: format!("search-term refinement failed: {err}"),
            }),
        }
    }
}

/// Check the oracle's pick against the offered slice. Returns the validated
/// quantity, or the corrective message to append to the thread.
fn validate_proposal(
    proposal: &SelectionProposal,
    offered: &[CandidateProduct],
) -> Result<u32, String> {
    if !offered
        .iter()
        .any(|candidate| candidate.item_id == proposal.item_id)
    {
        return Err(format!(
            "Product selection failed: itemId \"{}\" not a valid selection.",
            proposal.item_id
        ));
    }
    if proposal.quantity < 1 {
        return Err(format!(
            "Product selection failed: quantity \"{}\" is invalid (cannot be < 1).",
            proposal.quantity
        ));
    }
    // Reject rather than truncate an out-of-range count.
    u32::try_from(proposal.quantity).map_err(|_| {
        format!(
            "Product selection failed: quantity \"{}\" is invalid (exceeds the maximum orderable amount).",
            proposal.quantity
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn candidate(item_id: i64) -> CandidateProduct {
        CandidateProduct {
            item_id,
            name: format!("Product {item_id}"),
            sale_price: Some(Decimal::new(199, 2)),
            size: None,
            stock: Some("Available".into()),
            offer_type: Some("ONLINE_AND_STORE".into()),
        }
    }

    fn proposal(item_id: i64, quantity: i64) -> SelectionProposal {
        SelectionProposal {
            call_id: "call_1".into(),
            item_id,
            quantity,
            rationale: "test".into(),
        }
    }

    #[test]
    fn test_validate_accepts_offered_id() {
        let offered = vec![candidate(1), candidate(2)];
        assert_eq!(validate_proposal(&proposal(2, 3), &offered), Ok(3));
    }

    #[test]
    fn test_validate_rejects_foreign_id() {
        let offered = vec![candidate(1), candidate(2)];
        let err = validate_proposal(&proposal(999, 1), &offered).unwrap_err();
        assert!(err.contains("999"));
        assert!(err.contains("not a valid selection"));
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let offered = vec![candidate(1)];
        let err = validate_proposal(&proposal(1, 0), &offered).unwrap_err();
        assert!(err.contains("invalid"));
        assert!(validate_proposal(&proposal(1, -2), &offered).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_quantity_instead_of_truncating() {
        let offered = vec![candidate(1)];
        let oversized = (1i64 << 32) + 5;
        let err = validate_proposal(&proposal(1, oversized), &offered).unwrap_err();
        assert!(err.contains("invalid"), "message: {err}");
        assert!(err.contains(&oversized.to_string()));
        assert!(validate_proposal(&proposal(1, i64::MAX), &offered).is_err());
        // The largest representable count still passes.
        assert_eq!(
            validate_proposal(&proposal(1, u32::MAX as i64), &offered),
            Ok(u32::MAX)
        );
    }
}
