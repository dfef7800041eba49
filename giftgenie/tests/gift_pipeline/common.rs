//! Common backends and fixtures for pipeline tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use giftgenie::marketplace::{ProductSource, RawListing};
use llm_gateway::{
    ClientOptions, CompletionBackend, CompletionRequest, CompletionResponse, GatewayError,
    GenerationClient,
};

/// Routes each prompt to a canned, well-formed answer for its stage.
/// Plays the role of a cooperative generation backend.
pub struct StubGenBackend;

fn respond(prompt: &str) -> String {
    if prompt.contains("search keywords") {
        r#"["smartphone tripod under $30", "vinyl records under $30", "camera strap"]"#.to_string()
    } else if prompt.contains("final reasoned selection") {
        r#"["Photography, Mini tabletop tripod: steady shots for the new camera",
            "Music, Vintage vinyl record: matches their taste",
            "Photography, Hand-tooled leather camera strap: daily carry upgrade"]"#
            .to_string()
    } else if prompt.contains("Argue against") || prompt.contains("Counter this argument") {
        "It may duplicate gear the recipient already owns.".to_string()
    } else if prompt.contains("Argue") {
        "It fits their photography hobby and the budget.".to_string()
    } else if prompt.contains("Generate unique and specific gift ideas") {
        r#"{"Photography": ["Mini tabletop tripod", "Hand-tooled leather camera strap"],
            "Music": ["Vintage vinyl record"]}"#
            .to_string()
    } else if prompt.contains("suggest potential gift categories")
        || prompt.contains("Gift categories:")
    {
        r#"["camera accessories", "vinyl and audio", "phone gadgets", "travel gear", "specialty snacks"]"#
            .to_string()
    } else if prompt.contains("interest areas") {
        r#"["Photography", "Technology", "Music", "Travel", "Fitness"]"#.to_string()
    } else {
        "unhandled prompt".to_string()
    }
}

#[async_trait]
impl CompletionBackend for StubGenBackend {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        let prompt = req
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(CompletionResponse {
            content: respond(prompt),
            input_tokens: 0,
            output_tokens: 0,
            latency: Duration::from_millis(1),
        })
    }
}

/// Reachable but erratic: answers every prompt with unstructured prose.
pub struct ErraticBackend;

#[async_trait]
impl CompletionBackend for ErraticBackend {
    async fn complete(&self, _req: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        Ok(CompletionResponse {
            content: "Well, it depends on many factors, hard to say really".to_string(),
            input_tokens: 0,
            output_tokens: 0,
            latency: Duration::from_millis(1),
        })
    }
}

/// Total outage: every call fails as unavailable.
pub struct OutageBackend;

#[async_trait]
impl CompletionBackend for OutageBackend {
    async fn complete(&self, _req: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        Err(GatewayError::backend("503 service unavailable", true))
    }
}

/// Succeeds for the first `good_calls` completions, then goes down.
pub struct DyingBackend {
    calls: AtomicU32,
    good_calls: u32,
}

impl DyingBackend {
    pub fn new(good_calls: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            good_calls,
        }
    }
}

#[async_trait]
impl CompletionBackend for DyingBackend {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.good_calls {
            return Err(GatewayError::backend("503 service unavailable", true));
        }
        StubGenBackend.complete(req).await
    }
}

/// Single-attempt client over any backend; keeps call counts exact.
pub fn client_over(backend: Arc<dyn CompletionBackend>) -> GenerationClient {
    let options = ClientOptions::builder()
        .max_attempts(1)
        .retry_base_delay(Duration::from_millis(1))
        .build();
    GenerationClient::new(backend, options)
}

/// Product source returning one well-formed listing per keyword.
pub struct StaticSource;

#[async_trait]
impl ProductSource for StaticSource {
    async fn search(&self, keyword: &str, _max_items: usize) -> Result<Vec<RawListing>> {
        Ok(vec![json!({
            "title": format!("Best match for {keyword}"),
            "price": {"value": 19.99, "currency": "USD"},
            "stars": 4.4,
            "thumbnailImage": "https://img.example/item.jpg",
            "url": "https://www.amazon.com/dp/TEST",
            "purchase_info": "500 bought in past month",
        })])
    }
}

/// Product source with nothing to sell.
pub struct EmptySource;

#[async_trait]
impl ProductSource for EmptySource {
    async fn search(&self, _keyword: &str, _max_items: usize) -> Result<Vec<RawListing>> {
        Ok(Vec::new())
    }
}
