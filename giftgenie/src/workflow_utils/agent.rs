//! Stage agent construction and execution.

use giftgenie_sdk::{log_agent_complete, log_agent_failed, log_agent_start};
use llm_gateway::{GatewayError, GenerationClient, ToolSpec};

/// A generation agent bound to one pipeline stage.
///
/// Holds the stage's fixed system prompt and tool bindings next to the
/// shared client handle. Built once per run and memoized in the run
/// context; every `chat` call reuses the same persona.
#[derive(Debug, Clone)]
pub struct StageAgent {
    name: String,
    client: GenerationClient,
    system_prompt: String,
    tools: Vec<ToolSpec>,
}

impl StageAgent {
    pub fn new(
        name: impl Into<String>,
        client: GenerationClient,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send one user message and collect the completion text.
    ///
    /// Only backend unavailability is an error here; whatever text comes
    /// back is handed to the stage's parser untouched.
    pub async fn chat(&self, message: &str) -> Result<String, GatewayError> {
        let preview: String = message.chars().take(80).collect();
        log_agent_start!(&self.name, preview);

        match self
            .client
            .complete(message, Some(&self.system_prompt), &self.tools)
            .await
        {
            Ok(response) => {
                log_agent_complete!(&self.name);
                Ok(response)
            }
            Err(e) => {
                log_agent_failed!(&self.name, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_gateway::{
        ClientOptions, CompletionBackend, CompletionRequest, CompletionResponse, Role,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct CapturingBackend;

    #[async_trait]
    impl CompletionBackend for CapturingBackend {
        async fn complete(
            &self,
            req: &CompletionRequest,
        ) -> Result<CompletionResponse, GatewayError> {
            assert_eq!(req.messages[0].role, Role::System);
            assert!(req.messages[0].content.contains("gift ideas"));
            Ok(CompletionResponse {
                content: format!("tools={}", req.tools.len()),
                input_tokens: 0,
                output_tokens: 0,
                latency: Duration::from_millis(1),
            })
        }
    }

    #[tokio::test]
    async fn test_agent_sends_system_prompt_and_tools() {
        let client = GenerationClient::new(Arc::new(CapturingBackend), ClientOptions::default());
        let agent = StageAgent::new("Idea Generator", client, "You suggest gift ideas.")
            .with_tools(vec![ToolSpec::new(
                "generate_ideas",
                "Generate gift ideas",
                serde_json::json!({"type": "object"}),
            )]);

        let out = agent.chat("go").await.unwrap();
        assert_eq!(out, "tools=1");
        assert_eq!(agent.name(), "Idea Generator");
    }
}
