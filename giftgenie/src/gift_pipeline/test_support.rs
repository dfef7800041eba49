//! Scripted backends for stage unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llm_gateway::{
    ClientOptions, CompletionBackend, CompletionRequest, CompletionResponse, GatewayError,
    GenerationClient,
};

use crate::gift_pipeline::context::RunContext;

/// Returns queued responses in order; errors as unavailable once the
/// script runs dry.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, _req: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(content) => Ok(CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
                latency: Duration::from_millis(1),
            }),
            None => Err(GatewayError::backend("script exhausted", true)),
        }
    }
}

/// Always unavailable.
pub struct OutageBackend;

#[async_trait]
impl CompletionBackend for OutageBackend {
    async fn complete(&self, _req: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        Err(GatewayError::backend("503 service unavailable", true))
    }
}

/// Single-attempt options so scripted call counts stay predictable.
pub fn single_attempt_options() -> ClientOptions {
    ClientOptions::builder()
        .max_attempts(1)
        .retry_base_delay(Duration::from_millis(1))
        .build()
}

pub fn scripted_client(responses: Vec<String>) -> GenerationClient {
    GenerationClient::new(Arc::new(ScriptedBackend::new(responses)), single_attempt_options())
}

/// Context over a scripted backend, budget $30.
pub fn scripted_context(responses: Vec<String>) -> RunContext {
    RunContext::new(scripted_client(responses), 30.0)
}

/// Context over an empty script (any call errors), budget $30.
pub fn test_context() -> RunContext {
    scripted_context(Vec::new())
}

/// Context over a permanently unavailable backend, budget $30.
pub fn failing_context() -> RunContext {
    RunContext::new(
        GenerationClient::new(Arc::new(OutageBackend), single_attempt_options()),
        30.0,
    )
}
