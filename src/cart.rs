//! Cart and Checkout URL
//!
//! Resolved cart lines and the pure encoder producing the retailer's
//! cart-import URL.

use serde::{Deserialize, Serialize};

use crate::walmart::CandidateProduct;

/// One resolved shopping-list entry, ready for checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "itemId")]
    pub item_id: i64,
    pub quantity: u32,
    pub seller: String,
    /// Oracle's stated reason for this pick.
    pub rationale: String,
    /// Full search candidate the line was built from.
    #[serde(rename = "itemDetails", skip_serializing_if = "Option::is_none")]
    pub source: Option<CandidateProduct>,
}

/// Ordered cart, input-order preserving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl IntoIterator for Cart {
    type Item = CartLine;
    type IntoIter = std::vec::IntoIter<CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

/// Encode a cart as a retailer checkout URL.
///
/// Format: `<base>?items=<id>[_<qty>],...` with the quantity suffix omitted
/// for quantity 1 (bare id means one). Lines with quantity below 1 should
/// already have been filtered out by the list resolver; they are skipped here
/// again with a warning. An empty cart encodes to an empty `items=` parameter.
pub fn encode_cart_url(base_url: &str, cart: &Cart) -> String {
    let mut ids = Vec::with_capacity(cart.len());
    for line in cart.lines() {
        if line.quantity < 1 {
            tracing::warn!(
                item_id = line.item_id,
                "skipping cart line with zero quantity"
            );
            continue;
        }
        if line.quantity == 1 {
            ids.push(line.item_id.to_string());
        } else {
            ids.push(format!("{}_{}", line.item_id, line.quantity));
        }
    }
    format!("{}?items={}", base_url, ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: i64, quantity: u32) -> CartLine {
        CartLine {
            item_id,
            quantity,
            seller: crate::walmart::SELLER.to_string(),
            rationale: "test".to_string(),
            source: None,
        }
    }

    #[test]
    fn test_encode_omits_unit_quantity_suffix() {
        let mut cart = Cart::new();
        cart.push(line(111, 1));
        cart.push(line(222, 3));
        assert_eq!(
            encode_cart_url("https://affil.walmart.com/cart/addToCart", &cart),
            "https://affil.walmart.com/cart/addToCart?items=111,222_3"
        );
    }

    #[test]
    fn test_encode_empty_cart() {
        assert_eq!(
            encode_cart_url("https://affil.walmart.com/cart/addToCart", &Cart::new()),
            "https://affil.walmart.com/cart/addToCart?items="
        );
    }

    #[test]
    fn test_encode_skips_zero_quantity_lines() {
        let mut cart = Cart::new();
        cart.push(line(111, 1));
        cart.push(line(222, 0));
        cart.push(line(333, 2));
        assert_eq!(
            encode_cart_url("https://example.com/cart", &cart),
            "https://example.com/cart?items=111,333_2"
        );
    }

    #[test]
    fn test_cart_line_serialization_shape() {
        let json = serde_json::to_value(line(42, 1)).unwrap();
        assert_eq!(json["itemId"], 42);
        assert_eq!(json["seller"], "walmart");
        assert!(json.get("itemDetails").is_none());
    }
}
