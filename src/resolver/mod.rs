//! Shopping-List Resolution Pipeline
//!
//! Fan-out/fan-in resolution of a shopping list into a cart. One item
//! resolver per entry runs concurrently; each coordinates the product search
//! client and the selection oracle under a bounded retry budget, and every
//! per-item failure mode is contained inside that item's outcome.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;

pub mod item;
pub mod list;

pub use item::{ItemResolver, MAX_OFFERED_CANDIDATES};
pub use list::{CartResult, ShoppingListResolver};

/// One ingredient's purchase request, derived from a recipe by an external
/// extraction step. Consumed read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    /// Ingredient as stated in the recipe.
    pub ingredient: String,
    /// Search term for the store product to purchase.
    #[serde(rename = "product")]
    pub product_search_term: String,
    /// Free-form human quantity ("1 cup", "2 lbs").
    pub quantity: String,
}

/// Terminal result of resolving one shopping-list entry.
///
/// An explicit variant replaces the legacy `itemId=0/quantity=0` sentinel
/// record, so an unresolved entry can never be mistaken for a real catalog
/// line.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Resolved(CartLine),
    Skipped { reason: String },
}
