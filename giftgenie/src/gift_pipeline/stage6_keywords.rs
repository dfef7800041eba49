//! Stage 7: convert finalists into marketplace search keywords.
//!
//! The prompt asks for the budget qualifier, but the instruction is only
//! a hint; the invariant is enforced here after parsing, and every keyword
//! leaving this stage contains the `under $<budget>` phrase.

use llm_gateway::GatewayError;

use crate::gift_pipeline::context::RunContext;
use crate::gift_pipeline::types::{budget_qualifier, format_budget, Finalist, StageOutcome};
use crate::workflow_utils::parse::parse_string_list;
use crate::workflow_utils::StageAgent;

const SYSTEM_PROMPT: &str = "\
You are an assistant that generates marketplace search keywords based on \
gift ideas. Provide a JSON array of short search phrases, each including \
a price qualifier.";

/// Fixed keyword for a run that produced nothing usable.
pub fn fallback_keyword(budget: f64) -> String {
    format!("Gift under ${}", format_budget(budget))
}

/// Generate one search keyword per finalist, each carrying the budget
/// qualifier. The result always has exactly `finalists.len()` entries
/// (padded with the fixed fallback keyword when the parse comes up
/// short).
pub async fn generate_keywords(
    ctx: &mut RunContext,
    finalists: &[Finalist],
) -> Result<(Vec<String>, StageOutcome), GatewayError> {
    let agent = ctx.agent_for("keyword_generation", |client| {
        StageAgent::new("Keyword Generator", client.clone(), SYSTEM_PROMPT)
    });

    let target = finalists.len().max(1);
    let gift_lines: Vec<String> = finalists
        .iter()
        .map(|f| format!("{}: {}", f.idea_label, f.rationale))
        .collect();

    let prompt = format!(
        "Based on the following gift ideas, generate marketplace search \
         keywords. Each keyword should be a short phrase suitable for \
         searching on a shopping site, and should include \"{}\" or a \
         similar price qualifier.\n\nGift ideas:\n{}\n\nProvide a JSON \
         array of {target} search keywords:",
        budget_qualifier(ctx.budget),
        gift_lines.join("\n"),
    );

    let raw = agent.chat(&prompt).await?;
    let fallback = fallback_keyword(ctx.budget);
    let parsed = parse_string_list(&raw, &[fallback.as_str()]);
    let used_fallback = parsed.used_fallback();

    let mut keywords: Vec<String> = parsed
        .value
        .into_iter()
        .map(|k| ensure_budget_qualifier(&k, ctx.budget))
        .collect();

    keywords.truncate(target);
    while keywords.len() < target {
        keywords.push(fallback.clone());
    }

    ctx.artifacts.keywords = keywords.clone();

    let outcome = if used_fallback {
        StageOutcome::Fallback {
            reason: "keyword parse cascade exhausted".to_string(),
        }
    } else {
        StageOutcome::Generated
    };

    Ok((keywords, outcome))
}

/// Fixed output for a run degraded at this stage.
pub fn fallback_keywords(budget: f64, target: usize) -> Vec<String> {
    vec![fallback_keyword(budget); target.max(1)]
}

/// Append the qualifier phrase when the keyword lacks it. The check is
/// case-insensitive; the appended form is canonical.
pub fn ensure_budget_qualifier(keyword: &str, budget: f64) -> String {
    let qualifier = budget_qualifier(budget);
    if keyword.to_lowercase().contains(&qualifier.to_lowercase()) {
        keyword.to_string()
    } else {
        format!("{} {}", keyword.trim(), qualifier)
    }
}
