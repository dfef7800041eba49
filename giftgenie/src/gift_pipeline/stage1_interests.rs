//! Stage 2: derive interest areas from the post digest.

use llm_gateway::GatewayError;

use crate::gift_pipeline::context::RunContext;
use crate::gift_pipeline::types::{InterestSet, PostDigest, StageOutcome};
use crate::workflow_utils::parse::parse_string_list;
use crate::workflow_utils::StageAgent;

/// Minimum interest categories fed to the next stage.
pub const MIN_INTERESTS: usize = 5;

/// Default interest areas, also used to pad short results.
pub const DEFAULT_INTERESTS: [&str; 5] =
    ["Technology", "Self-Care", "Travel", "Food", "Fitness"];

const SYSTEM_PROMPT: &str = "\
You are an assistant that analyzes social posts and categorizes them into \
interest areas or activities. Provide a JSON array of at least 5 category \
strings based on the given posts. If you can't determine specific \
interests, use these default categories: Technology, Self-Care, Travel, \
Food, Fitness.";

/// Extract at least [`MIN_INTERESTS`] interest categories. Short results
/// are padded from the defaults; an unusable completion falls back to
/// the default list outright.
pub async fn extract_interests(
    ctx: &mut RunContext,
    digest: &PostDigest,
) -> Result<(InterestSet, StageOutcome), GatewayError> {
    let agent = ctx.agent_for("interest_extraction", |client| {
        StageAgent::new("Interest Analyzer", client.clone(), SYSTEM_PROMPT)
    });

    let prompt = format!(
        "Analyze the following posts and categorize them into interest areas \
         or activities. Provide a JSON array of at least {MIN_INTERESTS} \
         category strings.\n\nPosts:\n{}\n\nCategories:",
        digest.posts.join("\n"),
    );

    let raw = agent.chat(&prompt).await?;
    let parsed = parse_string_list(&raw, &DEFAULT_INTERESTS);
    let used_fallback = parsed.used_fallback();

    let categories = pad_categories(parsed.value, &DEFAULT_INTERESTS, MIN_INTERESTS);
    ctx.artifacts.interests = categories.clone();

    let outcome = if used_fallback {
        StageOutcome::Fallback {
            reason: "interest parse cascade exhausted".to_string(),
        }
    } else {
        StageOutcome::Generated
    };

    Ok((InterestSet { categories }, outcome))
}

/// Fixed output for a run degraded at this stage.
pub fn fallback_interests() -> InterestSet {
    InterestSet {
        categories: DEFAULT_INTERESTS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Dedupe (case-insensitive, order-preserving) and pad with defaults up
/// to the floor.
pub fn pad_categories(categories: Vec<String>, defaults: &[&str], floor: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for category in categories {
        let key = category.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(category);
        }
    }

    for default in defaults {
        if out.len() >= floor {
            break;
        }
        let key = default.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(default.to_string());
        }
    }

    out
}
