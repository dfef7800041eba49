//! Per-run mutable state shared across stages.

use std::collections::HashMap;
use std::sync::Arc;

use giftgenie_sdk::RunHandle;
use llm_gateway::GenerationClient;

use crate::gift_pipeline::types::{DebateSet, Finalist, GiftIdea};
use crate::workflow_utils::StageAgent;

/// Artifacts accumulated as the run advances. Later stages read back
/// earlier output (the debate prompt wants the original posts and
/// interests, not just the idea list).
#[derive(Debug, Clone, Default)]
pub struct RunArtifacts {
    pub posts: Vec<String>,
    pub interests: Vec<String>,
    pub gift_categories: Vec<String>,
    pub ideas: Vec<GiftIdea>,
    pub debates: DebateSet,
    pub finalists: Vec<Finalist>,
    pub keywords: Vec<String>,
}

/// Mutable context owned by exactly one run's sequential control flow.
///
/// Never shared across concurrent runs and never persisted; concurrent
/// users each get their own context, so no locking discipline is needed
/// inside it.
pub struct RunContext {
    pub run: RunHandle,
    pub client: GenerationClient,
    /// Price ceiling for this run, threaded into every budget-sensitive
    /// prompt.
    pub budget: f64,
    pub artifacts: RunArtifacts,
    agents: HashMap<&'static str, Arc<StageAgent>>,
}

impl RunContext {
    pub fn new(client: GenerationClient, budget: f64) -> Self {
        Self {
            run: RunHandle::new(),
            client,
            budget,
            artifacts: RunArtifacts::default(),
            agents: HashMap::new(),
        }
    }

    /// Fetch the agent registered under `key`, building it on first use.
    /// The builder runs at most once per run per key; stages that hold
    /// two personas (the debate pro/con pair) register one key each.
    pub fn agent_for(
        &mut self,
        key: &'static str,
        build: impl FnOnce(&GenerationClient) -> StageAgent,
    ) -> Arc<StageAgent> {
        if let Some(agent) = self.agents.get(key) {
            return agent.clone();
        }
        let agent = Arc::new(build(&self.client));
        self.agents.insert(key, agent.clone());
        agent
    }

    /// Whether an agent has been constructed under `key` yet.
    pub fn has_agent(&self, key: &str) -> bool {
        self.agents.contains_key(key)
    }
}
