//! Stage 4: generate specific candidate gift ideas.

use llm_gateway::GatewayError;

use crate::gift_pipeline::context::RunContext;
use crate::gift_pipeline::types::{format_budget, GiftCategorySet, GiftIdea, StageOutcome};
use crate::workflow_utils::parse::parse_category_map;
use crate::workflow_utils::StageAgent;

/// Hard ceiling on the candidate idea list.
pub const MAX_IDEAS: usize = 10;

/// Fixed candidates for a run that produced no usable ideas.
pub const FALLBACK_IDEAS: [(&str, &str); 5] = [
    ("Technology", "Portable smartphone projector"),
    ("Self-Care", "Organic facial serum"),
    ("Entertainment", "Independent cinema movie tickets"),
    ("Music", "Vintage vinyl record"),
    ("Photography", "Mini tabletop tripod for smartphones"),
];

const SYSTEM_PROMPT: &str = "\
You are an assistant specialized in generating unique and thoughtful gift \
ideas based on specific user information. Suggest gift items tailored to \
the user's interests, posts, and identified gift categories. Focus on \
items that are unique, personal, and directly related to the user's \
preferences; avoid any generic or default suggestions. Provide your \
suggestions as a JSON object where keys are categories and values are \
arrays of gift idea strings.";

/// Produce up to [`MAX_IDEAS`] specific gift ideas, deduplicated by
/// `(category, label)`. Reads the interests and raw posts back out of
/// the run context, not just the category set.
pub async fn generate_ideas(
    ctx: &mut RunContext,
    categories: &GiftCategorySet,
) -> Result<(Vec<GiftIdea>, StageOutcome), GatewayError> {
    let agent = ctx.agent_for("idea_generation", |client| {
        StageAgent::new("Idea Generator", client.clone(), SYSTEM_PROMPT)
    });

    let prompt = format!(
        "Based on the following user-specific information:\n\n\
         Interests: {}\n\
         Posts:\n{}\n\
         Gift Categories: {}\n\n\
         Generate unique and specific gift ideas under ${}. Focus on items \
         that are:\n\
         1. Directly related to the user's interests and gift categories\n\
         2. Unique and not commonly found in regular stores\n\
         3. Specific to the person's interests, avoiding generic items\n\
         4. Preferably from local artisans, small businesses, or specialty shops\n\
         5. Include a mix of physical items and experiences\n\
         6. Aim for a total of {MAX_IDEAS} gift ideas across all categories\n\n\
         Present your suggestions as a JSON object where keys are categories \
         and values are arrays of gift idea strings.\n\nGift Ideas:",
        ctx.artifacts.interests.join(", "),
        ctx.artifacts.posts.join("\n"),
        categories.categories.join(", "),
        format_budget(ctx.budget),
    );

    let raw = agent.chat(&prompt).await?;

    let (ideas, outcome) = match parse_category_map(&raw) {
        Some((entries, _tier)) => {
            let ideas = flatten_ideas(entries);
            if ideas.is_empty() {
                (
                    fallback_ideas(),
                    StageOutcome::Fallback {
                        reason: "parsed map contained no usable ideas".to_string(),
                    },
                )
            } else {
                (ideas, StageOutcome::Generated)
            }
        }
        None => (
            fallback_ideas(),
            StageOutcome::Fallback {
                reason: "idea parse cascade exhausted".to_string(),
            },
        ),
    };

    ctx.artifacts.ideas = ideas.clone();
    Ok((ideas, outcome))
}

/// Fixed output for a run degraded at this stage.
pub fn fallback_ideas() -> Vec<GiftIdea> {
    FALLBACK_IDEAS
        .iter()
        .map(|(category, label)| GiftIdea::new(*category, *label))
        .collect()
}

/// Flatten the category map, dedupe by `(category, label)` ignoring
/// case, and cap at [`MAX_IDEAS`].
fn flatten_ideas(entries: Vec<(String, Vec<String>)>) -> Vec<GiftIdea> {
    let mut seen: Vec<(String, String)> = Vec::new();
    let mut ideas = Vec::new();

    for (category, items) in entries {
        for label in items {
            let key = (category.to_lowercase(), label.to_lowercase());
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            ideas.push(GiftIdea::new(category.clone(), label));
            if ideas.len() >= MAX_IDEAS {
                return ideas;
            }
        }
    }

    ideas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gift_pipeline::test_support::scripted_context;

    fn categories() -> GiftCategorySet {
        GiftCategorySet {
            categories: vec!["camera accessories".into(), "trail gear".into()],
        }
    }

    #[tokio::test]
    async fn test_json_map_flattened() {
        let mut ctx = scripted_context(vec![
            r#"{"camera accessories": ["Hand-tooled leather camera strap", "Vintage lens adapter"],
                "trail gear": ["Topographic map print of a favorite trail"]}"#
                .into(),
        ]);

        let (ideas, outcome) = generate_ideas(&mut ctx, &categories()).await.unwrap();

        assert_eq!(ideas.len(), 3);
        assert!(ideas.iter().any(|i| i.label == "Vintage lens adapter"));
        assert_eq!(outcome, StageOutcome::Generated);
        assert_eq!(ctx.artifacts.ideas.len(), 3);
    }

    #[tokio::test]
    async fn test_manual_extraction_fallback_format() {
        let raw = "camera accessories:\n- Leather strap\n- Lens pouch\ntrail gear:\n- Trek poles";
        let mut ctx = scripted_context(vec![raw.into()]);

        let (ideas, outcome) = generate_ideas(&mut ctx, &categories()).await.unwrap();

        assert_eq!(ideas.len(), 3);
        assert_eq!(outcome, StageOutcome::Generated);
    }

    #[tokio::test]
    async fn test_unusable_output_uses_fixed_ideas() {
        let mut ctx = scripted_context(vec!["nothing machine readable".into()]);

        let (ideas, outcome) = generate_ideas(&mut ctx, &categories()).await.unwrap();

        assert_eq!(ideas.len(), FALLBACK_IDEAS.len());
        assert_eq!(ideas[0].label, "Portable smartphone projector");
        assert!(matches!(outcome, StageOutcome::Fallback { .. }));
    }

    #[test]
    fn test_flatten_caps_and_dedupes() {
        let mut entries = Vec::new();
        entries.push((
            "Tech".to_string(),
            (0..8).map(|i| format!("Gadget {i}")).collect::<Vec<_>>(),
        ));
        // Duplicate (case-folded) and overflow items
        let mut more: Vec<String> = vec!["gadget 0".into()];
        more.extend((0..8).map(|i| format!("Tool {i}")));
        entries.push(("tech".to_string(), more));

        let ideas = flatten_ideas(entries);

        assert_eq!(ideas.len(), MAX_IDEAS);
        let dupes = ideas
            .iter()
            .filter(|i| i.label.eq_ignore_ascii_case("gadget 0"))
            .count();
        assert_eq!(dupes, 1);
    }
}
