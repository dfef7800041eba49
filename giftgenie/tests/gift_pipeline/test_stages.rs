//! Stage-contract tests over scripted backends.

use std::sync::Arc;

use giftgenie::gift_pipeline::context::RunContext;
use giftgenie::gift_pipeline::stage0_initialize::initialize;
use giftgenie::gift_pipeline::stage1_interests::extract_interests;
use giftgenie::gift_pipeline::stage2_categories::map_categories;
use giftgenie::gift_pipeline::stage6_keywords::generate_keywords;
use giftgenie::gift_pipeline::{Finalist, RawInput, StageOutcome};
use giftgenie::workflow_utils::parse::{parse_string_list, ParseTier};

use super::common::{client_over, ErraticBackend, StubGenBackend};

fn stub_context() -> RunContext {
    RunContext::new(client_over(Arc::new(StubGenBackend)), 30.0)
}

fn erratic_context() -> RunContext {
    RunContext::new(client_over(Arc::new(ErraticBackend)), 30.0)
}

#[test]
fn test_empty_input_never_yields_empty_digest() {
    let mut ctx = stub_context();
    let input = RawInput::new(vec![], None, 30.0);

    let (digest, outcome) = initialize(&mut ctx, &input);

    assert!(!digest.posts.is_empty());
    assert!(matches!(outcome, StageOutcome::Fallback { .. }));
}

#[tokio::test]
async fn test_interest_floor_holds_for_erratic_backend() {
    let mut ctx = erratic_context();
    let input = RawInput::new(vec!["a post".into()], None, 30.0);
    let (digest, _) = initialize(&mut ctx, &input);

    let (interests, _) = extract_interests(&mut ctx, &digest).await.unwrap();

    assert!(interests.categories.len() >= 5);
}

#[tokio::test]
async fn test_category_floor_holds_for_erratic_backend() {
    let mut ctx = erratic_context();
    let input = RawInput::new(vec!["a post".into()], None, 30.0);
    let (digest, _) = initialize(&mut ctx, &input);
    let (interests, _) = extract_interests(&mut ctx, &digest).await.unwrap();

    let (categories, _) = map_categories(&mut ctx, &interests).await.unwrap();

    assert!(categories.categories.len() >= 5);
}

#[tokio::test]
async fn test_keywords_always_carry_qualifier() {
    for ctx_builder in [stub_context as fn() -> RunContext, erratic_context] {
        let mut ctx = ctx_builder();
        let finalists = vec![
            Finalist {
                idea_label: "Mini tabletop tripod".into(),
                rationale: "steady shots".into(),
            },
            Finalist {
                idea_label: "Vintage vinyl record".into(),
                rationale: "matches their taste".into(),
            },
            Finalist {
                idea_label: "Leather camera strap".into(),
                rationale: "daily carry".into(),
            },
        ];

        let (keywords, _) = generate_keywords(&mut ctx, &finalists).await.unwrap();

        assert_eq!(keywords.len(), 3);
        for keyword in keywords {
            assert!(
                keyword.contains("under $30"),
                "keyword missing qualifier: {keyword}"
            );
        }
    }
}

#[test]
fn test_parser_is_idempotent() {
    let samples = [
        r#"["a", "b", "c"]"#,
        "- a\n- b",
        "1. one thing\n2. another",
        "no structure at all",
        "maybe \"quoted salvage\" works",
    ];

    for raw in samples {
        let first = parse_string_list(raw, &["fallback"]);
        let second = parse_string_list(raw, &["fallback"]);
        assert_eq!(first.value, second.value, "sample: {raw}");
        assert_eq!(first.tier, second.tier, "sample: {raw}");
    }
}

#[test]
fn test_parser_cascade_tiers_are_ordered() {
    // Strict beats relaxed beats lines beats salvage beats fallback.
    assert_eq!(
        parse_string_list(r#"["x"]"#, &["d"]).tier,
        ParseTier::Strict
    );
    assert_eq!(parse_string_list("- x\n- y", &["d"]).tier, ParseTier::Relaxed);
    assert_eq!(
        parse_string_list("1. x\n2. y", &["d"]).tier,
        ParseTier::Lines
    );
    assert_eq!(
        parse_string_list("try \"x\" instead", &["d"]).tier,
        ParseTier::Salvage
    );
    assert_eq!(
        parse_string_list("nothing", &["d"]).tier,
        ParseTier::Fallback
    );
}
