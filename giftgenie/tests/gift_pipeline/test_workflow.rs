//! End-to-end orchestration tests.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use giftgenie::gift_pipeline::{
    run_gift_workflow, PipelineConfig, RawInput, RunState, StageId, StageOutcome,
};

use super::common::{
    client_over, DyingBackend, EmptySource, ErraticBackend, OutageBackend, StaticSource,
    StubGenBackend,
};

fn smartphone_input() -> RawInput {
    RawInput::new(
        vec!["Loving my new smartphone. The camera is amazing!".to_string()],
        Some(String::new()),
        30.0,
    )
}

#[tokio::test]
async fn test_end_to_end_completed() {
    let result = run_gift_workflow(
        &PipelineConfig::default(),
        smartphone_input(),
        client_over(Arc::new(StubGenBackend)),
        Arc::new(StaticSource),
        None,
    )
    .await;

    assert_eq!(result.state, RunState::Completed);
    assert!(!result.degraded);
    assert_eq!(result.listings.len(), 3);
    assert_eq!(result.finalists.len(), 3);
    assert_eq!(result.keywords.len(), 3);
    assert_eq!(result.trace.len(), StageId::COUNT);
    for keyword in &result.keywords {
        assert!(keyword.contains("under $30"));
    }
    for listing in &result.listings {
        assert_eq!(listing.price, Some(19.99));
    }
}

#[tokio::test]
async fn test_five_finalists_configuration() {
    let config = PipelineConfig {
        finalist_target: 5,
        ..Default::default()
    };

    let result = run_gift_workflow(
        &config,
        smartphone_input(),
        client_over(Arc::new(StubGenBackend)),
        Arc::new(StaticSource),
        None,
    )
    .await;

    assert_eq!(result.state, RunState::Completed);
    assert_eq!(result.finalists.len(), 5);
    assert_eq!(result.keywords.len(), 5);
    assert_eq!(result.listings.len(), 5);
}

// Erratic prose answers force parse fallbacks everywhere, including the
// reasoning retry loop; the run must still complete with the configured
// cardinalities. Paused clock auto-advances the retry delays.
#[tokio::test(start_paused = true)]
async fn test_erratic_backend_degrades_but_completes() {
    let result = run_gift_workflow(
        &PipelineConfig::default(),
        smartphone_input(),
        client_over(Arc::new(ErraticBackend)),
        Arc::new(StaticSource),
        None,
    )
    .await;

    assert_eq!(result.state, RunState::Completed);
    assert!(result.degraded);
    assert_eq!(result.listings.len(), 3);
    assert_eq!(result.finalists.len(), 3);
    for keyword in &result.keywords {
        assert!(keyword.contains("under $30"));
    }
}

#[tokio::test]
async fn test_total_outage_fails_with_no_fallback_stages() {
    let result = run_gift_workflow(
        &PipelineConfig::default(),
        smartphone_input(),
        client_over(Arc::new(OutageBackend)),
        Arc::new(StaticSource),
        None,
    )
    .await;

    assert_eq!(result.state, RunState::Failed);
    assert!(result.listings.is_empty());
    // Nothing was substituted: no generation stage output existed to
    // degrade from.
    let substituted = result
        .trace
        .iter()
        .filter(|t| {
            t.stage != StageId::Initialize
                && matches!(t.outcome, StageOutcome::Fallback { .. })
        })
        .count();
    assert_eq!(substituted, 0);
}

#[tokio::test]
async fn test_mid_run_outage_degrades_and_completes() {
    // Interests and categories succeed, then the backend goes down.
    let result = run_gift_workflow(
        &PipelineConfig::default(),
        smartphone_input(),
        client_over(Arc::new(DyingBackend::new(2))),
        Arc::new(EmptySource),
        None,
    )
    .await;

    assert_eq!(result.state, RunState::Completed);
    assert!(result.degraded);
    assert_eq!(result.listings.len(), 3);
    assert!(result.listings.iter().all(|l| l.is_not_found()));
    for keyword in &result.keywords {
        assert!(keyword.contains("under $30"));
    }

    let interests = result
        .trace
        .iter()
        .find(|t| t.stage == StageId::InterestExtraction)
        .unwrap();
    assert_eq!(interests.outcome, StageOutcome::Generated);

    let ideas = result
        .trace
        .iter()
        .find(|t| t.stage == StageId::IdeaGeneration)
        .unwrap();
    assert!(matches!(ideas.outcome, StageOutcome::Fallback { .. }));
}

#[tokio::test]
async fn test_empty_lookup_yields_sentinels_not_failure() {
    let result = run_gift_workflow(
        &PipelineConfig::default(),
        smartphone_input(),
        client_over(Arc::new(StubGenBackend)),
        Arc::new(EmptySource),
        None,
    )
    .await;

    assert_eq!(result.state, RunState::Completed);
    assert_eq!(result.listings.len(), 3);
    for listing in &result.listings {
        assert!(listing.is_not_found());
        assert_eq!(listing.price, None);
    }
}

#[tokio::test]
async fn test_pre_cancelled_run_stops_at_first_checkpoint() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = run_gift_workflow(
        &PipelineConfig::default(),
        smartphone_input(),
        client_over(Arc::new(StubGenBackend)),
        Arc::new(StaticSource),
        Some(cancel),
    )
    .await;

    assert_eq!(result.state, RunState::Cancelled);
    assert!(result.listings.is_empty());
    // Only the initialize stage ran before the checkpoint.
    assert_eq!(result.trace.len(), 1);
    assert_eq!(result.trace[0].stage, StageId::Initialize);
}

#[tokio::test]
async fn test_zero_deadline_times_out_with_trace_preserved() {
    let config = PipelineConfig {
        deadline: Some(Duration::ZERO),
        ..Default::default()
    };

    let result = run_gift_workflow(
        &config,
        smartphone_input(),
        client_over(Arc::new(StubGenBackend)),
        Arc::new(StaticSource),
        None,
    )
    .await;

    assert_eq!(result.state, RunState::TimedOut);
    assert_eq!(result.trace.len(), 1);
}

#[tokio::test]
async fn test_debate_turn_order_through_full_run() {
    // Drive the stages individually, the way a progressive UI would.
    use giftgenie::gift_pipeline::context::RunContext;
    use giftgenie::gift_pipeline::stage0_initialize::initialize;
    use giftgenie::gift_pipeline::stage1_interests::extract_interests;
    use giftgenie::gift_pipeline::stage2_categories::map_categories;
    use giftgenie::gift_pipeline::stage3_ideas::generate_ideas;
    use giftgenie::gift_pipeline::stage4_debate::run_debates;
    use giftgenie::gift_pipeline::Side;

    let mut ctx = RunContext::new(client_over(Arc::new(StubGenBackend)), 30.0);

    let (digest, _) = initialize(&mut ctx, &smartphone_input());
    let (interests, _) = extract_interests(&mut ctx, &digest).await.unwrap();
    let (categories, _) = map_categories(&mut ctx, &interests).await.unwrap();
    let (ideas, _) = generate_ideas(&mut ctx, &categories).await.unwrap();
    let (debates, _) = run_debates(&mut ctx, &ideas).await.unwrap();

    assert_eq!(debates.len(), ideas.len());
    for record in debates.records() {
        assert!(record.turns.len() >= 2);
        assert_eq!(record.turns[0].side, Side::Con);
        assert_eq!(record.turns[1].side, Side::Pro);
        assert_eq!(record.turns.last().unwrap().side, Side::Pro);
    }
}
