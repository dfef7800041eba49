//! Pipeline orchestration for gift suggestion runs.
//!
//! The orchestrator drives the eight stages strictly in sequence over a
//! single [`RunContext`]; each stage's typed output is the next stage's
//! input, and later stages read accumulated context. Only backend
//! unavailability can fail a run, and only when no generation stage has
//! succeeded yet; otherwise the failing stage's fixed fallback output
//! is substituted and the run continues, flagged degraded. Cancellation
//! and the run deadline are checked cooperatively between stages; an
//! in-flight generation call is allowed to finish and its result is
//! discarded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use giftgenie_sdk::{log_stage_complete, log_stage_failed, log_stage_fallback, log_stage_start};
use llm_gateway::GenerationClient;
use tokio_util::sync::CancellationToken;

use crate::gift_pipeline::context::RunContext;
use crate::gift_pipeline::stage0_initialize::initialize;
use crate::gift_pipeline::stage1_interests::extract_interests;
use crate::gift_pipeline::stage2_categories::{fallback_gift_categories, map_categories};
use crate::gift_pipeline::stage3_ideas::{fallback_ideas, generate_ideas};
use crate::gift_pipeline::stage4_debate::{fallback_debates, run_debates};
use crate::gift_pipeline::stage5_reasoner::{fallback_finalists, select_finalists};
use crate::gift_pipeline::stage6_keywords::{fallback_keywords, generate_keywords};
use crate::gift_pipeline::stage7_products::{
    resolve_products, DEFAULT_LOOKUP_CONCURRENCY,
};
use crate::gift_pipeline::types::{
    PipelineResult, RawInput, RunState, StageId, StageOutcome, StageTrace,
};
use crate::marketplace::ProductSource;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Exact finalist cardinality (3 or 5).
    pub finalist_target: usize,
    /// Bound on concurrent product lookups.
    pub lookup_concurrency: usize,
    /// Overall wall-clock budget; checked between stages.
    pub deadline: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            finalist_target: 3,
            lookup_concurrency: DEFAULT_LOOKUP_CONCURRENCY,
            deadline: None,
        }
    }
}

/// Run the full pipeline. The result always comes back: failure,
/// cancellation, and timeout are terminal states on it, not errors.
pub async fn run_gift_workflow(
    config: &PipelineConfig,
    input: RawInput,
    client: GenerationClient,
    products: Arc<dyn ProductSource>,
    cancel: Option<CancellationToken>,
) -> PipelineResult {
    let mut ctx = RunContext::new(client, input.budget);
    let started = Instant::now();
    let mut trace: Vec<StageTrace> = Vec::new();
    let mut degraded = false;
    // Set once any generation stage returns output; before that, an
    // unreachable backend fails the run outright.
    let mut any_generation_ok = false;

    let result = |ctx: &RunContext, state, degraded, trace: Vec<StageTrace>, listings| {
        PipelineResult {
            run_id: *ctx.run.id(),
            state,
            degraded,
            listings,
            finalists: ctx.artifacts.finalists.clone(),
            keywords: ctx.artifacts.keywords.clone(),
            trace,
        }
    };

    // Stage 1: Initialize
    let stage = StageId::Initialize;
    log_stage_start!(stage.index(), stage.name(), StageId::COUNT);
    let (digest, outcome) = initialize(&mut ctx, &input);
    record(&mut trace, &mut degraded, stage, outcome, format!("{} posts", digest.posts.len()));

    if let Some(state) = interrupted(&cancel, started, config.deadline) {
        return result(&ctx, state, degraded, trace, Vec::new());
    }

    // Stage 2: Interest Extraction
    let stage = StageId::InterestExtraction;
    log_stage_start!(stage.index(), stage.name(), StageId::COUNT);
    let interests = match extract_interests(&mut ctx, &digest).await {
        Ok((interests, outcome)) => {
            any_generation_ok = true;
            record(&mut trace, &mut degraded, stage, outcome, format!("{} interests", interests.categories.len()));
            interests
        }
        Err(e) => {
            log_stage_failed!(stage.index(), stage.name(), e);
            return result(&ctx, RunState::Failed, degraded, trace, Vec::new());
        }
    };

    if let Some(state) = interrupted(&cancel, started, config.deadline) {
        return result(&ctx, state, degraded, trace, Vec::new());
    }

    // Stage 3: Category Mapping
    let stage = StageId::CategoryMapping;
    log_stage_start!(stage.index(), stage.name(), StageId::COUNT);
    let categories = match map_categories(&mut ctx, &interests).await {
        Ok((categories, outcome)) => {
            record(&mut trace, &mut degraded, stage, outcome, format!("{} gift categories", categories.categories.len()));
            categories
        }
        Err(e) => {
            debug_assert!(any_generation_ok);
            let categories = fallback_gift_categories();
            ctx.artifacts.gift_categories = categories.categories.clone();
            substitute(&mut trace, &mut degraded, stage, &e);
            categories
        }
    };

    if let Some(state) = interrupted(&cancel, started, config.deadline) {
        return result(&ctx, state, degraded, trace, Vec::new());
    }

    // Stage 4: Idea Generation
    let stage = StageId::IdeaGeneration;
    log_stage_start!(stage.index(), stage.name(), StageId::COUNT);
    let ideas = match generate_ideas(&mut ctx, &categories).await {
        Ok((ideas, outcome)) => {
            record(&mut trace, &mut degraded, stage, outcome, format!("{} ideas", ideas.len()));
            ideas
        }
        Err(e) => {
            let ideas = fallback_ideas();
            ctx.artifacts.ideas = ideas.clone();
            substitute(&mut trace, &mut degraded, stage, &e);
            ideas
        }
    };

    if let Some(state) = interrupted(&cancel, started, config.deadline) {
        return result(&ctx, state, degraded, trace, Vec::new());
    }

    // Stage 5: Debate
    let stage = StageId::Debate;
    log_stage_start!(stage.index(), stage.name(), StageId::COUNT);
    let debates = match run_debates(&mut ctx, &ideas).await {
        Ok((debates, outcome)) => {
            record(&mut trace, &mut degraded, stage, outcome, format!("{} debates", debates.len()));
            debates
        }
        Err(e) => {
            let debates = fallback_debates(&ideas);
            ctx.artifacts.debates = debates.clone();
            substitute(&mut trace, &mut degraded, stage, &e);
            debates
        }
    };

    if let Some(state) = interrupted(&cancel, started, config.deadline) {
        return result(&ctx, state, degraded, trace, Vec::new());
    }

    // Stage 6: Reasoning
    let stage = StageId::Reasoning;
    log_stage_start!(stage.index(), stage.name(), StageId::COUNT);
    let finalists = match select_finalists(&mut ctx, &debates, config.finalist_target).await {
        Ok((finalists, outcome)) => {
            record(&mut trace, &mut degraded, stage, outcome, format!("{} finalists", finalists.len()));
            finalists
        }
        Err(e) => {
            let finalists = fallback_finalists(&ctx.artifacts.ideas, &debates, config.finalist_target);
            ctx.artifacts.finalists = finalists.clone();
            substitute(&mut trace, &mut degraded, stage, &e);
            finalists
        }
    };

    if let Some(state) = interrupted(&cancel, started, config.deadline) {
        return result(&ctx, state, degraded, trace, Vec::new());
    }

    // Stage 7: Keyword Generation
    let stage = StageId::KeywordGeneration;
    log_stage_start!(stage.index(), stage.name(), StageId::COUNT);
    let keywords = match generate_keywords(&mut ctx, &finalists).await {
        Ok((keywords, outcome)) => {
            record(&mut trace, &mut degraded, stage, outcome, format!("{} keywords", keywords.len()));
            keywords
        }
        Err(e) => {
            let keywords = fallback_keywords(ctx.budget, config.finalist_target);
            ctx.artifacts.keywords = keywords.clone();
            substitute(&mut trace, &mut degraded, stage, &e);
            keywords
        }
    };

    if let Some(state) = interrupted(&cancel, started, config.deadline) {
        return result(&ctx, state, degraded, trace, Vec::new());
    }

    // Stage 8: Product Resolution
    let stage = StageId::ProductResolution;
    log_stage_start!(stage.index(), stage.name(), StageId::COUNT);
    let (listings, outcome) =
        resolve_products(&keywords, products, config.lookup_concurrency).await;
    record(&mut trace, &mut degraded, stage, outcome, format!("{} listings", listings.len()));

    result(&ctx, RunState::Completed, degraded, trace, listings)
}

fn record(
    trace: &mut Vec<StageTrace>,
    degraded: &mut bool,
    stage: StageId,
    outcome: StageOutcome,
    detail: String,
) {
    match &outcome {
        StageOutcome::Generated => {
            log_stage_complete!(stage.index(), stage.name());
        }
        StageOutcome::Fallback { reason } => {
            *degraded = true;
            log_stage_fallback!(stage.index(), stage.name(), reason);
        }
    }
    trace.push(StageTrace {
        stage,
        outcome,
        detail,
    });
}

fn substitute(
    trace: &mut Vec<StageTrace>,
    degraded: &mut bool,
    stage: StageId,
    error: &llm_gateway::GatewayError,
) {
    record(
        trace,
        degraded,
        stage,
        StageOutcome::Fallback {
            reason: format!("generation unavailable: {error}"),
        },
        "fixed fallback output substituted".to_string(),
    );
}

fn interrupted(
    cancel: &Option<CancellationToken>,
    started: Instant,
    deadline: Option<Duration>,
) -> Option<RunState> {
    if cancel.as_ref().map(|c| c.is_cancelled()).unwrap_or(false) {
        return Some(RunState::Cancelled);
    }
    if let Some(deadline) = deadline {
        if started.elapsed() >= deadline {
            return Some(RunState::TimedOut);
        }
    }
    None
}
