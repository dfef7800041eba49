//! Marketplace product lookup.
//!
//! The external lookup returns heterogeneous listing records: price as
//! a `{value, currency}` object, bare number, or prose; ratings as
//! numbers or "4.5 out of 5 stars" text; two image field spellings. The
//! adapter normalizes all of that into [`ProductListing`], keeping the
//! absent/unparseable-means-`None` rule (zero is a valid price and must
//! not stand in for missing data).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::gift_pipeline::types::ProductListing;
use crate::workflow_utils::parse::{salvage_monthly_purchases, salvage_number};

/// A raw listing record as the lookup service returned it.
pub type RawListing = Value;

/// Seam to the external product lookup capability. An empty result is a
/// valid response, not an error.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn search(&self, keyword: &str, max_items: usize) -> Result<Vec<RawListing>>;
}

/// Apify actor adapter: runs the marketplace scraper actor synchronously
/// and returns its dataset items.
#[derive(Debug, Clone)]
pub struct ApifyProductSource {
    client: reqwest::Client,
    base_url: String,
    actor_id: String,
    api_token: String,
}

impl ApifyProductSource {
    const DEFAULT_ACTOR: &'static str = "BG3WDrGdteHgZgbPK";

    pub fn new(api_token: impl Into<String>) -> Self {
        Self::with_config(api_token, "https://api.apify.com", Self::DEFAULT_ACTOR)
    }

    /// Create from `APIFY_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("APIFY_API_TOKEN").context("APIFY_API_TOKEN not set")?;
        Ok(Self::new(token))
    }

    pub fn with_config(
        api_token: impl Into<String>,
        base_url: impl Into<String>,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            actor_id: actor_id.into(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl ProductSource for ApifyProductSource {
    async fn search(&self, keyword: &str, max_items: usize) -> Result<Vec<RawListing>> {
        let search_url = reqwest::Url::parse_with_params(
            "https://www.amazon.com/s",
            &[("k", keyword)],
        )
        .context("building search URL")?;

        let run_input = serde_json::json!({
            "categoryOrProductUrls": [{"url": search_url.as_str()}],
            "maxItemsPerStartUrl": max_items,
            "proxyCountry": "AUTO_SELECT_PROXY_COUNTRY",
            "maxOffers": 0,
            "scrapeSellers": false,
            "useCaptchaSolver": false,
            "scrapeProductVariantPrices": false,
        });

        let url = format!(
            "{}/v2/acts/{}/run-sync-get-dataset-items?token={}",
            self.base_url, self.actor_id, self.api_token
        );

        let response = self
            .client
            .post(&url)
            .json(&run_input)
            .send()
            .await
            .context("calling product lookup actor")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("product lookup returned HTTP {}", status.as_u16());
        }

        let items: Vec<RawListing> = response
            .json()
            .await
            .context("decoding product lookup response")?;
        Ok(items)
    }
}

/// Normalize one raw record into the fixed listing shape.
pub fn normalize_listing(raw: &RawListing) -> ProductListing {
    let title = raw
        .get("title")
        .and_then(|t| t.as_str())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("No title available")
        .to_string();

    let price = extract_price(raw);
    let rating = extract_rating(raw);

    let image_url = raw
        .get("thumbnailImage")
        .or_else(|| raw.get("thumbnail"))
        .or_else(|| raw.get("image"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let product_url = raw
        .get("url")
        .or_else(|| raw.get("product_url"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    ProductListing {
        title,
        price,
        rating,
        image_url,
        product_url,
    }
}

/// "N bought in past month" annotation, when the record carries one.
pub fn purchase_info(raw: &RawListing) -> Option<u32> {
    raw.get("purchase_info")
        .or_else(|| raw.get("boughtInPastMonth"))
        .and_then(|v| v.as_str())
        .and_then(salvage_monthly_purchases)
}

fn extract_price(raw: &RawListing) -> Option<f64> {
    let price = raw.get("price")?;

    let value = match price {
        Value::Object(obj) => match obj.get("value")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => salvage_number(s),
            _ => None,
        },
        Value::Number(n) => n.as_f64(),
        Value::String(s) => salvage_number(s),
        _ => None,
    }?;

    (value >= 0.0).then_some(value)
}

fn extract_rating(raw: &RawListing) -> Option<f64> {
    let rating = raw.get("stars").or_else(|| raw.get("rating"))?;

    let value = match rating {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => salvage_number(s),
        _ => None,
    }?;

    (0.0..=5.0).contains(&value).then_some(value)
}
