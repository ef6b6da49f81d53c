//! Walmart Affiliate Product Search
//!
//! Client for the affiliate product API. Request signing lives outside this
//! crate; the HTTP client only attaches whatever headers its
//! [`HeaderProvider`] hands it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Seller tag stamped on every resolved cart line.
pub const SELLER: &str = "walmart";

/// Offer types that permit purchase.
const PURCHASABLE_OFFER_TYPES: [&str; 2] = ["ONLINE_AND_STORE", "STORE_ONLY"];

/// One search result for a given term, prior to selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProduct {
    #[serde(rename = "itemId")]
    pub item_id: i64,
    pub name: String,
    #[serde(rename = "salePrice", default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(rename = "stock", default)]
    pub stock: Option<String>,
    #[serde(rename = "offerType", default)]
    pub offer_type: Option<String>,
}

impl CandidateProduct {
    /// In stock and offered through a purchasable channel.
    pub fn purchasable(&self) -> bool {
        self.stock.as_deref() == Some("Available")
            && self
                .offer_type
                .as_deref()
                .is_some_and(|offer| PURCHASABLE_OFFER_TYPES.contains(&offer))
    }
}

/// Slimmed candidate view shown to the oracle. Keeping the prompt to these
/// four fields bounds its size.
#[derive(Debug, Serialize)]
pub struct OfferedCandidate<'a> {
    #[serde(rename = "itemId")]
    pub item_id: i64,
    pub name: &'a str,
    #[serde(rename = "salePrice", skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'a str>,
}

impl<'a> From<&'a CandidateProduct> for OfferedCandidate<'a> {
    fn from(product: &'a CandidateProduct) -> Self {
        Self {
            item_id: product.item_id,
            name: &product.name,
            sale_price: product.sale_price,
            size: product.size.as_deref(),
        }
    }
}

/// Drop unpurchasable items and cap what the oracle gets to see.
pub fn filter_candidates(items: &[CandidateProduct], cap: usize) -> Vec<CandidateProduct> {
    items
        .iter()
        .filter(|item| item.purchasable())
        .take(cap)
        .cloned()
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<CandidateProduct>,
}

/// Product search contract the resolver depends on.
#[async_trait]
pub trait ProductSearch: Send + Sync {
    /// Ranked candidates for a search term. Transport or parse failures
    /// surface as `Err` and are treated as "zero candidates" upstream.
    async fn search(&self, term: &str) -> Result<Vec<CandidateProduct>>;
}

/// Supplies signed request headers for the affiliate API. Signature
/// generation is an external concern.
pub trait HeaderProvider: Send + Sync {
    fn headers(&self) -> Result<Vec<(String, String)>>;
}

/// Fixed header set, assembled once from configuration.
pub struct StaticHeaders(pub Vec<(String, String)>);

impl StaticHeaders {
    /// Consumer-id and key-version headers from config, plus an externally
    /// produced signature if `WALMART_AUTH_SIGNATURE` is set.
    pub fn from_config(config: &Config) -> Self {
        let mut headers = Vec::new();
        if let Some(consumer_id) = &config.consumer_id {
            headers.push(("WM_CONSUMER.ID".to_string(), consumer_id.clone()));
        }
        headers.push(("WM_SEC.KEY_VERSION".to_string(), config.key_version.clone()));
        if let Ok(signature) = std::env::var("WALMART_AUTH_SIGNATURE") {
            headers.push(("WM_SEC.AUTH_SIGNATURE".to_string(), signature));
        }
        Self(headers)
    }
}

impl HeaderProvider for StaticHeaders {
    fn headers(&self) -> Result<Vec<(String, String)>> {
        Ok(self.0.clone())
    }
}

/// HTTP client for the affiliate product API.
pub struct AffiliateClient {
    http: reqwest::Client,
    base_url: String,
    header_provider: Arc<dyn HeaderProvider>,
    timeout: Duration,
}

impl AffiliateClient {
    pub fn new(config: &Config, header_provider: Arc<dyn HeaderProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.affiliate_base_url.trim_end_matches('/').to_string(),
            header_provider,
            timeout: config.request_timeout,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let mut request = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .timeout(self.timeout)
            .query(query);
        for (name, value) in self.header_provider.headers()? {
            request = request.header(name, value);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Walmart API error {}: {}", status, body));
        }
        Ok(response.json().await?)
    }

    /// Look up a single product by item id.
    pub async fn lookup(&self, item_id: i64) -> Result<Vec<CandidateProduct>> {
        let ids = item_id.to_string();
        let response: SearchResponse = self.get_json("items", &[("ids", ids.as_str())]).await?;
        Ok(response.items)
    }
}

#[async_trait]
impl ProductSearch for AffiliateClient {
    async fn search(&self, term: &str) -> Result<Vec<CandidateProduct>> {
        let response: SearchResponse = self.get_json("search", &[("query", term)]).await?;
        tracing::debug!(term, count = response.items.len(), "product search returned");
        Ok(response.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(item_id: i64, stock: &str, offer_type: &str) -> CandidateProduct {
        CandidateProduct {
            item_id,
            name: format!("Product {item_id}"),
            sale_price: Some(Decimal::new(250, 2)),
            size: Some("1 lb".to_string()),
            stock: Some(stock.to_string()),
            offer_type: Some(offer_type.to_string()),
        }
    }

    #[test]
    fn test_filter_drops_unavailable_and_online_only() {
        let items = vec![
            candidate(1, "Available", "ONLINE_AND_STORE"),
            candidate(2, "Not available", "ONLINE_AND_STORE"),
            candidate(3, "Available", "ONLINE_ONLY"),
            candidate(4, "Available", "STORE_ONLY"),
        ];
        let filtered = filter_candidates(&items, 3);
        let ids: Vec<i64> = filtered.iter().map(|c| c.item_id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_filter_caps_at_top_n() {
        let items: Vec<CandidateProduct> = (1..=5)
            .map(|id| candidate(id, "Available", "ONLINE_AND_STORE"))
            .collect();
        let filtered = filter_candidates(&items, 3);
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[0].item_id, 1);
    }

    #[test]
    fn test_search_response_tolerates_missing_fields() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"query": "flour"}"#).unwrap();
        assert!(parsed.items.is_empty());

        let parsed: SearchResponse = serde_json::from_str(
            r#"{"items": [{"itemId": 42, "name": "GV Flour", "salePrice": 2.50,
                "stock": "Available", "offerType": "ONLINE_AND_STORE"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].item_id, 42);
        assert!(parsed.items[0].purchasable());
        assert!(parsed.items[0].size.is_none());
    }

    #[test]
    fn test_offered_candidate_omits_absent_props() {
        let mut product = candidate(7, "Available", "STORE_ONLY");
        product.size = None;
        let yaml = serde_yaml::to_string(&[OfferedCandidate::from(&product)]).unwrap();
        assert!(yaml.contains("itemId: 7"));
        assert!(!yaml.contains("size"));
    }
}
