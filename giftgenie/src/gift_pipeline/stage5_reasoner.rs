//! Stage 6: reason over the debate transcripts and pick finalists.
//!
//! This is the one stage that retries its generation+parse attempt: its
//! output feeds a monetary-qualified search, so a silently defaulted
//! result is costly. Network-level failures are not retried here (the
//! gateway already did that) and propagate immediately.

use std::time::Duration;

use llm_gateway::GatewayError;

use crate::gift_pipeline::context::RunContext;
use crate::gift_pipeline::stage3_ideas::fallback_ideas;
use crate::gift_pipeline::types::{DebateSet, Finalist, GiftIdea, StageOutcome};
use crate::workflow_utils::parse::parse_labeled_pairs;
use crate::workflow_utils::StageAgent;

/// Generation+parse attempts before the round-robin fallback.
pub const REASONING_ATTEMPTS: u32 = 3;

/// Fixed delay between attempts.
pub const REASONING_RETRY_DELAY: Duration = Duration::from_secs(5);

const SYSTEM_PROMPT: &str = "\
You are an assistant specialized in analyzing debates about gift ideas \
and making final selections. Consider uniqueness, practicality, and how \
well each idea matches the recipient's interests. The closing pro \
argument of each debate is the most recent word on the idea; weigh it \
most heavily. Present your selection as a JSON array of strings, where \
each string is in the format \"Gift Idea: Reasoning\".";

/// Select exactly `target` finalists from the debates. Parse failures
/// are retried up to [`REASONING_ATTEMPTS`] times; exhaustion falls back
/// to round-robin sampling from the idea set, bypassing debate content.
pub async fn select_finalists(
    ctx: &mut RunContext,
    debates: &DebateSet,
    target: usize,
) -> Result<(Vec<Finalist>, StageOutcome), GatewayError> {
    let agent = ctx.agent_for("reasoning", |client| {
        StageAgent::new("Gift Reasoner", client.clone(), SYSTEM_PROMPT)
    });

    let transcript = debates
        .records()
        .iter()
        .map(|r| format!("{}:\n{}", r.idea_label, r.transcript()))
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = format!(
        "Given the following debates about gift ideas, provide a final \
         reasoned selection of the top {target} gift ideas. Weigh the \
         closing pro argument of each debate most heavily. Present your \
         selection as a JSON array of {target} strings, each in the format \
         \"Gift Idea: Reasoning\".\n\nDebates:\n{transcript}\n\nFinal \
         Selection:"
    );

    let mut parsed: Option<Vec<Finalist>> = None;
    for attempt in 0..REASONING_ATTEMPTS {
        if attempt > 0 {
            tokio::time::sleep(REASONING_RETRY_DELAY).await;
        }

        let raw = agent.chat(&prompt).await?;
        if let Some((pairs, _tier)) = parse_labeled_pairs(&raw) {
            let finalists = dedupe_finalists(pairs);
            if !finalists.is_empty() {
                parsed = Some(finalists);
                break;
            }
        }
    }

    let (finalists, outcome) = match parsed {
        Some(finalists) => {
            let finalists = enforce_target(finalists, &ctx.artifacts.ideas, debates, target);
            (finalists, StageOutcome::Generated)
        }
        None => (
            fallback_finalists(&ctx.artifacts.ideas, debates, target),
            StageOutcome::Fallback {
                reason: format!("{REASONING_ATTEMPTS} parse attempts exhausted"),
            },
        ),
    };

    ctx.artifacts.finalists = finalists.clone();
    Ok((finalists, outcome))
}

/// Round-robin selection straight from the idea set, used when
/// reasoning could not produce a parseable selection. Deterministic.
pub fn fallback_finalists(
    ideas: &[GiftIdea],
    debates: &DebateSet,
    target: usize,
) -> Vec<Finalist> {
    enforce_target(Vec::new(), ideas, debates, target)
}

/// Pad with synthetic round-robin entries (or truncate) until the
/// selection has exactly `target` members.
fn enforce_target(
    mut finalists: Vec<Finalist>,
    ideas: &[GiftIdea],
    debates: &DebateSet,
    target: usize,
) -> Vec<Finalist> {
    finalists.truncate(target);

    let pool: Vec<String> = if !ideas.is_empty() {
        ideas.iter().map(|i| i.to_string()).collect()
    } else if !debates.is_empty() {
        debates
            .records()
            .iter()
            .map(|r| r.idea_label.clone())
            .collect()
    } else {
        fallback_ideas().iter().map(|i| i.to_string()).collect()
    };

    let mut cursor = 0usize;
    while finalists.len() < target {
        let label = pool[cursor % pool.len()].clone();
        cursor += 1;

        if finalists
            .iter()
            .any(|f| f.idea_label.eq_ignore_ascii_case(&label))
            && cursor <= pool.len()
        {
            continue;
        }

        let rationale = match debates.record(&label).and_then(|r| {
            r.pro_arguments().last().map(|p| p.to_string())
        }) {
            Some(pro) => format!(
                "Selected as a fallback option. Pro argument: {}",
                crate::gift_pipeline::types::truncate_chars(&pro, 100)
            ),
            None => "Selected as a fallback option.".to_string(),
        };

        finalists.push(Finalist {
            idea_label: label,
            rationale,
        });
    }

    finalists
}

fn dedupe_finalists(pairs: Vec<(String, String)>) -> Vec<Finalist> {
    let mut out: Vec<Finalist> = Vec::new();
    for (label, rationale) in pairs {
        if out
            .iter()
            .any(|f| f.idea_label.eq_ignore_ascii_case(&label))
        {
            continue;
        }
        out.push(Finalist {
            idea_label: label,
            rationale,
        });
    }
    out
}
