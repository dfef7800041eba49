//! Stage 1: compile the post digest every later stage reads.

use crate::gift_pipeline::context::RunContext;
use crate::gift_pipeline::types::{PostDigest, RawInput, StageOutcome};

/// Substituted when the caller supplies no posts and no free text.
pub const DEFAULT_POSTS: [&str; 5] = [
    "Just finished a great workout at the gym!",
    "Can't wait for my camping trip next weekend. Need to get some gear!",
    "Loving my new smartphone. The camera is amazing!",
    "Trying to eat healthier. Any good cookbook recommendations?",
    "Working on a new coding project. Python is so fun!",
];

/// Build the digest: unwrap posts that arrive as JSON records, fall back
/// to the default post list when nothing was supplied, and append the
/// free text as a final pseudo-post. The output is never empty.
pub fn initialize(ctx: &mut RunContext, input: &RawInput) -> (PostDigest, StageOutcome) {
    let mut posts: Vec<String> = input
        .posts
        .iter()
        .map(|post| decode_post(post))
        .filter(|post| !post.trim().is_empty())
        .collect();

    let defaulted = posts.is_empty()
        && input
            .free_text
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(true);

    if defaulted {
        posts = DEFAULT_POSTS.iter().map(|s| s.to_string()).collect();
    }

    if let Some(text) = input.free_text.as_deref() {
        if !text.trim().is_empty() {
            posts.push(text.trim().to_string());
        }
    }

    ctx.artifacts.posts = posts.clone();

    let outcome = if defaulted {
        StageOutcome::Fallback {
            reason: "no posts or free text supplied".to_string(),
        }
    } else {
        StageOutcome::Generated
    };

    (PostDigest { posts }, outcome)
}

/// Posts fetched upstream sometimes arrive as serialized records with a
/// `text` field; anything else passes through as-is.
fn decode_post(post: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(post) {
        if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
            return text.to_string();
        }
    }
    post.to_string()
}
