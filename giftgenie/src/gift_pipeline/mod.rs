//! Gift suggestion pipeline.
//!
//! Eight stages run strictly in sequence: initialize, interest
//! extraction, category mapping, idea generation, debate, reasoning,
//! keyword generation, product resolution. Each stage consumes its
//! predecessor's typed output, calls the generation backend, parses the
//! completion through the fallback cascade, and repairs its invariants
//! before handing off. The stage functions are public so a caller can
//! drive them one at a time for progressive display;
//! [`workflow::run_gift_workflow`] is the batteries-included entry.

pub mod context;
pub mod stage0_initialize;
pub mod stage1_interests;
pub mod stage2_categories;
pub mod stage3_ideas;
pub mod stage4_debate;
pub mod stage5_reasoner;
pub mod stage6_keywords;
pub mod stage7_products;
pub mod types;
pub mod workflow;

#[cfg(test)]
pub mod test_support;

pub use context::{RunArtifacts, RunContext};
pub use types::{
    budget_qualifier, format_budget, DebateRecord, DebateSet, DebateTurn, Finalist,
    GiftCategorySet, GiftIdea, InterestSet, PipelineResult, PostDigest, ProductListing, RawInput,
    RunState, Side, StageId, StageOutcome, StageTrace,
};
pub use workflow::{run_gift_workflow, PipelineConfig};
