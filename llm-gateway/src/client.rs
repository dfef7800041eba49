//! High-level generation client with adapter-level retry.

use std::sync::Arc;

use crate::backend::{CompletionBackend, OpenAiBackend};
use crate::error::GatewayError;
use crate::types::{ClientOptions, CompletionRequest, Message, ToolSpec};

/// Client handle shared by all stages of a pipeline run.
///
/// Cheap to clone; the backend is reference-counted. Retry policy lives
/// here and only here; callers treat a returned error as final.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn CompletionBackend>,
    options: ClientOptions,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, options: ClientOptions) -> Self {
        Self { backend, options }
    }

    /// Build against the OpenAI-compatible HTTP backend from environment
    /// variables.
    pub fn from_env(options: ClientOptions) -> Result<Self, GatewayError> {
        let backend = OpenAiBackend::from_env()?;
        Ok(Self::new(Arc::new(backend), options))
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Complete a prompt, optionally under a system context and with tool
    /// bindings the backend may invoke.
    ///
    /// Retries retryable failures up to `options.max_attempts` with
    /// exponential backoff. Rate-limit hints from the backend override
    /// the computed delay. The returned error, if any, is terminal.
    pub async fn complete(
        &self,
        prompt: &str,
        system_context: Option<&str>,
        tools: &[ToolSpec],
    ) -> Result<String, GatewayError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_context {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));

        let mut request = CompletionRequest::new(&self.options.model, messages);
        request.temperature = self.options.temperature;
        request.max_tokens = self.options.max_tokens;
        request.tools = tools.to_vec();

        let mut last_err: Option<GatewayError> = None;
        for attempt in 0..self.options.max_attempts {
            if attempt > 0 {
                let delay = match &last_err {
                    Some(GatewayError::RateLimited { retry_after, .. }) => *retry_after,
                    _ => self.options.retry_base_delay * 2u32.pow(attempt - 1),
                };
                tokio::time::sleep(delay).await;
            }

            match self.backend.complete(&request).await {
                Ok(response) => return Ok(response.content),
                Err(e) if e.is_retryable() && attempt + 1 < self.options.max_attempts => {
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| GatewayError::backend("retry budget exhausted", true)))
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("model", &self.options.model)
            .field("max_attempts", &self.options.max_attempts)
            .finish()
    }
}
