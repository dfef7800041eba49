//! Tests for pipeline data types.

use giftgenie::gift_pipeline::{
    budget_qualifier, DebateRecord, Finalist, GiftIdea, PipelineResult, ProductListing, RawInput,
    RunState, Side, StageId, StageOutcome, StageTrace,
};

#[test]
fn test_raw_input_creation() {
    let input = RawInput::new(
        vec!["Loving my new smartphone. The camera is amazing!".to_string()],
        Some("notes".to_string()),
        30.0,
    );

    assert_eq!(input.posts.len(), 1);
    assert_eq!(input.free_text.as_deref(), Some("notes"));
    assert_eq!(input.budget, 30.0);
}

#[test]
fn test_gift_idea_label_format() {
    let idea = GiftIdea::new("Photography", "Mini tabletop tripod");
    assert_eq!(idea.to_string(), "Photography: Mini tabletop tripod");
}

#[test]
fn test_debate_record_turn_order_survives_serialization() {
    let mut record = DebateRecord::new("Mini tabletop tripod");
    record.push_turn(Side::Con, "might not get used");
    record.push_turn(Side::Pro, "steady shots for the new camera");

    let json = serde_json::to_string(&record).unwrap();
    let back: DebateRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(back.turns.len(), 2);
    assert_eq!(back.turns[0].side, Side::Con);
    assert_eq!(back.turns[1].side, Side::Pro);
}

#[test]
fn test_argument_ceiling_enforced_at_capture() {
    let mut record = DebateRecord::new("x");
    record.push_turn(Side::Con, &"a".repeat(1000));
    assert_eq!(record.turns[0].text.chars().count(), 300);
}

#[test]
fn test_product_listing_round_trip() {
    let listing = ProductListing {
        title: "Vintage vinyl record".to_string(),
        price: Some(18.0),
        rating: Some(4.7),
        image_url: "https://img.example/v.jpg".to_string(),
        product_url: "https://www.amazon.com/dp/V1".to_string(),
    };

    let json = serde_json::to_string(&listing).unwrap();
    let back: ProductListing = serde_json::from_str(&json).unwrap();
    assert_eq!(back.price, Some(18.0));
    assert_eq!(back.rating, Some(4.7));
}

#[test]
fn test_sentinel_listing_has_no_numbers() {
    let listing = ProductListing::not_found();
    assert!(listing.is_not_found());
    assert_eq!(listing.price, None);
    assert_eq!(listing.rating, None);
}

#[test]
fn test_pipeline_result_serializes() {
    let result = PipelineResult {
        run_id: uuid::Uuid::new_v4(),
        state: RunState::Completed,
        degraded: true,
        listings: vec![ProductListing::not_found()],
        finalists: vec![Finalist {
            idea_label: "Vintage vinyl record".to_string(),
            rationale: "matches their taste".to_string(),
        }],
        keywords: vec!["vinyl records under $30".to_string()],
        trace: vec![StageTrace {
            stage: StageId::KeywordGeneration,
            outcome: StageOutcome::Fallback {
                reason: "parse cascade exhausted".to_string(),
            },
            detail: "1 keywords".to_string(),
        }],
    };

    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("Completed"));
    assert!(json.contains("KeywordGeneration"));

    let back: PipelineResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.state, RunState::Completed);
    assert!(back.degraded);
}

#[test]
fn test_stage_order_covers_all_eight() {
    assert_eq!(StageId::COUNT, 8);
    let indices: Vec<usize> = StageId::ALL.iter().map(|s| s.index()).collect();
    assert_eq!(indices, (1..=8).collect::<Vec<_>>());
}

#[test]
fn test_budget_qualifier_examples() {
    assert_eq!(budget_qualifier(30.0), "under $30");
    assert_eq!(budget_qualifier(45.5), "under $45.50");
}
