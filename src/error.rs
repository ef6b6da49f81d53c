//! Error types for shopping-list resolution
//!
//! Domain failure modes use thiserror enums for proper error messages;
//! orchestration and client code propagate `anyhow::Result`.

use thiserror::Error;

/// Failure modes inside a single item resolution.
///
/// None of these cross the item boundary: the item resolver converts every
/// variant into either another attempt or a skipped outcome, so the list-level
/// fan-in never has to handle item errors.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Search returned nothing purchasable (or nothing parsable).
    #[error("no purchasable candidates for search term '{term}'")]
    NoCandidates { term: String },

    /// The oracle picked an item outside the offered set, or a non-positive
    /// quantity. Paired with a corrective turn on the conversation thread.
    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String },

    /// Retry budget consumed. Terminal for this item only.
    #[error("failed to resolve '{term}' after {attempts} attempts")]
    RetryBudgetExhausted { term: String, attempts: u32 },

    /// The oracle broke the tool-call contract: wrong tool, missing fields,
    /// refusal, or plain text where a tool call was required. Fatal for this
    /// item; no further retries.
    #[error("oracle protocol violation: {0}")]
    ProtocolViolation(String),

    /// Transport-level failure reaching the search API or the oracle.
    #[error("external call failed: {0}")]
    Transport(String),
}

impl ResolveError {
    /// Whether this failure should consume a retry rather than end the item.
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            ResolveError::ProtocolViolation(_) | ResolveError::RetryBudgetExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(ResolveError::NoCandidates {
            term: "flour".into()
        }
        .is_retriable());
        assert!(ResolveError::InvalidSelection {
            reason: "bad id".into()
        }
        .is_retriable());
        assert!(ResolveError::Transport("timeout".into()).is_retriable());
        assert!(!ResolveError::ProtocolViolation("wrong tool".into()).is_retriable());
        assert!(!ResolveError::RetryBudgetExhausted {
            term: "flour".into(),
            attempts: 2
        }
        .is_retriable());
    }

    #[test]
    fn test_display_names_term_and_attempts() {
        let err = ResolveError::RetryBudgetExhausted {
            term: "saffron".into(),
            attempts: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("saffron"));
        assert!(msg.contains('3'));
    }
}
