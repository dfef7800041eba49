//! Stage 8: resolve search keywords to purchasable listings.
//!
//! The only stage with internal fan-out: per-keyword lookups are
//! independent once the keywords are fixed, so they run concurrently
//! under a small bound that respects the lookup service's rate limits.
//! The returned listings match the input keyword order regardless of
//! completion order. Lookup problems never fail the stage; an empty or
//! failed lookup yields the "no product found" sentinel.

use std::sync::Arc;

use giftgenie_sdk::log_agent_message;

use crate::gift_pipeline::types::{ProductListing, StageOutcome};
use crate::marketplace::{normalize_listing, purchase_info, ProductSource};
use crate::workflow_utils::execute_batch;

/// Default per-run bound on concurrent lookups.
pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 3;

/// Resolve every keyword to exactly one listing, in keyword order.
pub async fn resolve_products(
    keywords: &[String],
    source: Arc<dyn ProductSource>,
    concurrency: usize,
) -> (Vec<ProductListing>, StageOutcome) {
    let items: Vec<String> = keywords.to_vec();

    let results = execute_batch(items, concurrency, move |keyword, task| {
        let source = source.clone();
        async move {
            log_agent_message!(
                "Product Resolver",
                format!(
                    "Looking up {}/{}: {keyword}",
                    task.item_number, task.total_items
                )
            );
            let raw = source.search(&keyword, 1).await?;
            if let Some(count) = raw.first().and_then(purchase_info) {
                log_agent_message!(
                    "Product Resolver",
                    format!("{count} bought in past month")
                );
            }
            Ok(raw.first().map(normalize_listing))
        }
    })
    .await;

    let mut listings = Vec::with_capacity(results.len());
    let mut missing = 0usize;
    for result in results {
        match result {
            Ok(Some(listing)) => listings.push(listing),
            Ok(None) => {
                missing += 1;
                listings.push(ProductListing::not_found());
            }
            Err(e) => {
                missing += 1;
                log_agent_message!("Product Resolver", format!("Lookup failed: {e}"));
                listings.push(ProductListing::not_found());
            }
        }
    }

    let outcome = if missing == 0 {
        StageOutcome::Generated
    } else {
        StageOutcome::Fallback {
            reason: format!("{missing} of {} keywords had no product", listings.len()),
        }
    };

    (listings, outcome)
}

/// Fixed output for a run degraded at this stage.
pub fn fallback_listings(count: usize) -> Vec<ProductListing> {
    (0..count.max(1)).map(|_| ProductListing::not_found()).collect()
}
