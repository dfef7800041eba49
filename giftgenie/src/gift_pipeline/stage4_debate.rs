//! Stage 5: structured pro/con debate over each candidate idea.
//!
//! Turn order is fixed: every debate opens with a Con argument, answered
//! by a Pro argument conditioned on it, the adversarial opening. Three
//! further alternating rounds follow, and the final round is
//! pro-weighted: it closes with an uncountered Pro turn that the
//! reasoning stage is told to weigh most heavily.

use std::sync::Arc;

use llm_gateway::GatewayError;

use crate::gift_pipeline::context::RunContext;
use crate::gift_pipeline::types::{
    format_budget, truncate_chars, DebateRecord, DebateSet, GiftIdea, Side, StageOutcome,
    MAX_ARGUMENT_LEN,
};
use crate::gift_pipeline::stage3_ideas::fallback_ideas;
use crate::workflow_utils::StageAgent;

/// Alternating rounds after the opening exchange. Fixed by design.
const DEBATE_ROUNDS: usize = 3;

/// Canned arguments for an idea whose debate could not be generated.
pub const FALLBACK_CON: &str = "May not match specific interests";
pub const FALLBACK_PRO: &str = "Versatile gift";

const CON_SYSTEM_PROMPT: &str = "\
You are an assistant that argues against gift ideas. Present strong \
arguments opposing the given gift idea, focusing on potential drawbacks \
or limitations and specific reasons the recipient might not appreciate \
it. Keep your argument concise and persuasive, within 300 characters.";

const PRO_SYSTEM_PROMPT: &str = "\
You are an assistant that argues in favor of gift ideas. Present strong \
arguments supporting the given gift idea based on the user's interests, \
address and counter the previous argument against it, and focus on the \
positive aspects and potential benefits. Keep your argument concise and \
persuasive, within 300 characters.";

fn con_agent(ctx: &mut RunContext) -> Arc<StageAgent> {
    ctx.agent_for("debate_con", |client| {
        StageAgent::new("Con Debater", client.clone(), CON_SYSTEM_PROMPT)
    })
}

fn pro_agent(ctx: &mut RunContext) -> Arc<StageAgent> {
    ctx.agent_for("debate_pro", |client| {
        StageAgent::new("Pro Debater", client.clone(), PRO_SYSTEM_PROMPT)
    })
}

/// Debate every idea. Per-idea generation failure degrades that idea to
/// the canned argument pair; the stage only propagates when the backend
/// was unreachable before any argument was produced.
pub async fn run_debates(
    ctx: &mut RunContext,
    ideas: &[GiftIdea],
) -> Result<(DebateSet, StageOutcome), GatewayError> {
    let ideas: Vec<GiftIdea> = if ideas.is_empty() {
        fallback_ideas()
    } else {
        ideas.to_vec()
    };

    let con = con_agent(ctx);
    let pro = pro_agent(ctx);
    let budget = ctx.budget;

    let mut debates = DebateSet::new();
    let mut degraded_ideas = 0usize;
    let mut any_success = false;

    for idea in &ideas {
        match debate_idea(&con, &pro, idea, budget).await {
            Ok(record) => {
                any_success = true;
                debates.insert(record);
            }
            Err(e) if !any_success => return Err(e),
            Err(_) => {
                degraded_ideas += 1;
                debates.insert(fallback_record(&idea.to_string()));
            }
        }
    }

    ctx.artifacts.debates = debates.clone();

    let outcome = if degraded_ideas == 0 {
        StageOutcome::Generated
    } else {
        StageOutcome::Fallback {
            reason: format!(
                "{degraded_ideas} of {} ideas used canned arguments",
                ideas.len()
            ),
        }
    };

    Ok((debates, outcome))
}

/// Run the fixed turn script for one idea.
async fn debate_idea(
    con: &StageAgent,
    pro: &StageAgent,
    idea: &GiftIdea,
    budget: f64,
) -> Result<DebateRecord, GatewayError> {
    let label = idea.to_string();
    let budget = format_budget(budget);
    let mut record = DebateRecord::new(&label);

    // Adversarial opening: con speaks first.
    let mut last_con = con
        .chat(&format!(
            "Argue against the following gift idea as a gift under ${budget} \
             in 300 characters or less. Consider potential misalignment with \
             the recipient's interests, lack of practicality, or reasons the \
             recipient might not appreciate it.\n\nGift idea: {label}\n\n\
             Provide a concise argument against this gift:"
        ))
        .await?;
    record.push_turn(Side::Con, &last_con);

    let opening_pro = pro
        .chat(&format!(
            "Argue in favor of the following gift idea as a gift under \
             ${budget} in 300 characters or less. Address the previous \
             argument against it.\n\nGift idea: {label}\nPrevious argument \
             against: {}\n\nProvide a concise argument in favor of this gift:",
            truncate_chars(&last_con, MAX_ARGUMENT_LEN),
        ))
        .await?;
    record.push_turn(Side::Pro, &opening_pro);

    for round in 0..DEBATE_ROUNDS {
        let pro_argument = pro
            .chat(&format!(
                "Argue for this gift idea: {label}, considering: {}",
                truncate_chars(&last_con, MAX_ARGUMENT_LEN),
            ))
            .await?;
        record.push_turn(Side::Pro, &pro_argument);

        // The last round stays pro-weighted: no closing counter.
        if round < DEBATE_ROUNDS - 1 {
            let con_argument = con
                .chat(&format!(
                    "Counter this argument: {}",
                    truncate_chars(&pro_argument, MAX_ARGUMENT_LEN),
                ))
                .await?;
            record.push_turn(Side::Con, &con_argument);
            last_con = con_argument;
        }
    }

    Ok(record)
}

fn fallback_record(label: &str) -> DebateRecord {
    let mut record = DebateRecord::new(label);
    record.push_turn(Side::Con, FALLBACK_CON);
    record.push_turn(Side::Pro, FALLBACK_PRO);
    record
}

/// Fixed output for a run degraded at this stage: the canned argument
/// pair for every idea.
pub fn fallback_debates(ideas: &[GiftIdea]) -> DebateSet {
    let ideas: Vec<GiftIdea> = if ideas.is_empty() {
        fallback_ideas()
    } else {
        ideas.to_vec()
    };

    let mut debates = DebateSet::new();
    for idea in &ideas {
        debates.insert(fallback_record(&idea.to_string()));
    }
    debates
}
