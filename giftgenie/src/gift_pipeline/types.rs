//! Data structures for the gift suggestion pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hard ceiling on a single debate argument, enforced at capture time.
pub const MAX_ARGUMENT_LEN: usize = 300;

/// Seed input for one pipeline run. Created once at run start, never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInput {
    /// Recent social posts, newest first. May be empty.
    pub posts: Vec<String>,
    /// Free-form notes about the recipient.
    pub free_text: Option<String>,
    /// Price ceiling in dollars. Positive.
    pub budget: f64,
}

impl RawInput {
    pub fn new(posts: Vec<String>, free_text: Option<String>, budget: f64) -> Self {
        Self {
            posts,
            free_text,
            budget,
        }
    }
}

/// Initialize-stage output: the post texts every later stage reads.
/// Never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDigest {
    pub posts: Vec<String>,
}

/// Interest areas derived from the posts. At least five entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestSet {
    pub categories: Vec<String>,
}

/// Gift categories mapped from interests. At least five entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCategorySet {
    pub categories: Vec<String>,
}

/// One candidate gift idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftIdea {
    pub category: String,
    pub label: String,
}

impl GiftIdea {
    pub fn new(category: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            label: label.into(),
        }
    }
}

impl std::fmt::Display for GiftIdea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category, self.label)
    }
}

/// Which side a debate turn argues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Pro,
    Con,
}

/// One argument in a debate, captured in turn order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTurn {
    pub side: Side,
    pub text: String,
}

/// Truncate to a character budget without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// The full debate transcript for one gift idea.
///
/// Turn-order invariant: the opening turn is always Con, answered by a
/// Pro turn. Arguments are truncated to [`MAX_ARGUMENT_LEN`] when
/// captured, never re-requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRecord {
    pub idea_label: String,
    pub turns: Vec<DebateTurn>,
}

impl DebateRecord {
    pub fn new(idea_label: impl Into<String>) -> Self {
        Self {
            idea_label: idea_label.into(),
            turns: Vec::new(),
        }
    }

    /// Capture one argument, enforcing the length ceiling.
    pub fn push_turn(&mut self, side: Side, text: &str) {
        self.turns.push(DebateTurn {
            side,
            text: truncate_chars(text, MAX_ARGUMENT_LEN),
        });
    }

    /// Pro arguments in turn order.
    pub fn pro_arguments(&self) -> Vec<&str> {
        self.turns
            .iter()
            .filter(|t| t.side == Side::Pro)
            .map(|t| t.text.as_str())
            .collect()
    }

    /// Con arguments in turn order.
    pub fn con_arguments(&self) -> Vec<&str> {
        self.turns
            .iter()
            .filter(|t| t.side == Side::Con)
            .map(|t| t.text.as_str())
            .collect()
    }

    /// Render the transcript for the reasoning prompt.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| match t.side {
                Side::Pro => format!("Pro: {}", t.text),
                Side::Con => format!("Con: {}", t.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Debate transcripts keyed by idea label; labels unique, insertion
/// order preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebateSet {
    records: Vec<DebateRecord>,
}

impl DebateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; a record with a duplicate label is dropped.
    pub fn insert(&mut self, record: DebateRecord) {
        if self.record(&record.idea_label).is_none() {
            self.records.push(record);
        }
    }

    pub fn record(&self, idea_label: &str) -> Option<&DebateRecord> {
        self.records.iter().find(|r| r.idea_label == idea_label)
    }

    pub fn records(&self) -> &[DebateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One selected finalist with the reasoning behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finalist {
    pub idea_label: String,
    pub rationale: String,
}

/// A purchasable listing resolved from one search keyword.
///
/// `None` price/rating means the field was absent or unparseable at the
/// source; it is never coerced to zero, since zero is a valid value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListing {
    pub title: String,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub image_url: String,
    pub product_url: String,
}

impl ProductListing {
    /// Sentinel listing for a keyword with no marketplace results.
    pub fn not_found() -> Self {
        Self {
            title: "No product found".to_string(),
            price: None,
            rating: None,
            image_url: String::new(),
            product_url: String::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.title == "No product found" && self.product_url.is_empty()
    }
}

/// Pipeline stage identity, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    Initialize,
    InterestExtraction,
    CategoryMapping,
    IdeaGeneration,
    Debate,
    Reasoning,
    KeywordGeneration,
    ProductResolution,
}

impl StageId {
    pub const COUNT: usize = 8;

    pub const ALL: [StageId; Self::COUNT] = [
        StageId::Initialize,
        StageId::InterestExtraction,
        StageId::CategoryMapping,
        StageId::IdeaGeneration,
        StageId::Debate,
        StageId::Reasoning,
        StageId::KeywordGeneration,
        StageId::ProductResolution,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageId::Initialize => "Initialize",
            StageId::InterestExtraction => "Interest Extraction",
            StageId::CategoryMapping => "Category Mapping",
            StageId::IdeaGeneration => "Idea Generation",
            StageId::Debate => "Debate",
            StageId::Reasoning => "Reasoning",
            StageId::KeywordGeneration => "Keyword Generation",
            StageId::ProductResolution => "Product Resolution",
        }
    }

    /// 1-based position for progress display.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0) + 1
    }
}

/// How a stage's output was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOutcome {
    /// Parsed from a genuine generation result (any parse tier short of
    /// the fixed fallback).
    Generated,
    /// The stage's fixed fallback value was substituted.
    Fallback { reason: String },
}

/// Per-stage trace entry for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTrace {
    pub stage: StageId,
    pub outcome: StageOutcome,
    pub detail: String,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

/// Final result of one pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub state: RunState,
    /// True when any stage used fallback data. Soft flag; the run still
    /// counts as completed.
    pub degraded: bool,
    pub listings: Vec<ProductListing>,
    pub finalists: Vec<Finalist>,
    pub keywords: Vec<String>,
    pub trace: Vec<StageTrace>,
}

/// Render the budget figure the way prompts and keywords carry it:
/// whole dollars without a decimal tail, cents kept otherwise.
pub fn format_budget(budget: f64) -> String {
    if budget.fract() == 0.0 {
        format!("{}", budget as i64)
    } else {
        format!("{:.2}", budget)
    }
}

/// The qualifier phrase every search keyword must contain.
pub fn budget_qualifier(budget: f64) -> String {
    format!("under ${}", format_budget(budget))
}
