//! Stage 3: map interest areas to gift categories.

use llm_gateway::GatewayError;

use crate::gift_pipeline::context::RunContext;
use crate::gift_pipeline::stage1_interests::pad_categories;
use crate::gift_pipeline::types::{GiftCategorySet, InterestSet, StageOutcome};
use crate::workflow_utils::parse::parse_string_list;
use crate::workflow_utils::StageAgent;

/// Minimum gift categories fed to idea generation.
pub const MIN_GIFT_CATEGORIES: usize = 5;

/// Default gift categories, also used to pad short results.
pub const DEFAULT_GIFT_CATEGORIES: [&str; 6] = [
    "specialty dark chocolate",
    "premium coffee",
    "charcuterie board items",
    "perishable boutique pantry items",
    "fruit preserves",
    "fancy olive oil",
];

const SYSTEM_PROMPT: &str = "\
You are an assistant specializing in mapping interest categories to \
potential gift categories. Generate a diverse and relevant JSON array of \
gift category strings based on the given interests. Each gift category \
should be specific enough to be useful for gift searching, but broad \
enough to encompass multiple gift options. If the interests are unclear \
or insufficient, use these default gift categories: specialty dark \
chocolate, premium coffee, charcuterie board items, perishable boutique \
pantry items.";

/// Expand the interests into at least [`MIN_GIFT_CATEGORIES`] gift
/// categories, padding from the defaults as needed.
pub async fn map_categories(
    ctx: &mut RunContext,
    interests: &InterestSet,
) -> Result<(GiftCategorySet, StageOutcome), GatewayError> {
    let agent = ctx.agent_for("category_mapping", |client| {
        StageAgent::new("Interest Mapper", client.clone(), SYSTEM_PROMPT)
    });

    let prompt = format!(
        "For each of the following interest categories, suggest potential \
         gift categories. Provide a JSON array of at least \
         {MIN_GIFT_CATEGORIES} gift category strings.\n\nInterest \
         categories:\n{}\n\nGift categories:",
        interests.categories.join(", "),
    );

    let raw = agent.chat(&prompt).await?;
    let parsed = parse_string_list(&raw, &DEFAULT_GIFT_CATEGORIES);
    let used_fallback = parsed.used_fallback();

    let categories = pad_categories(parsed.value, &DEFAULT_GIFT_CATEGORIES, MIN_GIFT_CATEGORIES);
    ctx.artifacts.gift_categories = categories.clone();

    let outcome = if used_fallback {
        StageOutcome::Fallback {
            reason: "gift category parse cascade exhausted".to_string(),
        }
    } else {
        StageOutcome::Generated
    };

    Ok((GiftCategorySet { categories }, outcome))
}

/// Fixed output for a run degraded at this stage.
pub fn fallback_gift_categories() -> GiftCategorySet {
    GiftCategorySet {
        categories: DEFAULT_GIFT_CATEGORIES
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}
