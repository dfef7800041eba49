//! GiftGenie CLI: run the gift suggestion pipeline end to end.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use giftgenie::gift_pipeline::{
    format_budget, run_gift_workflow, PipelineConfig, RawInput, RunState, StageOutcome,
};
use giftgenie::marketplace::ApifyProductSource;
use giftgenie::run_log::RunLog;
use giftgenie::social::fetch_recent_posts;
use llm_gateway::{ClientOptions, GenerationClient};

/// GiftGenie CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "giftgenie",
    about = "Suggest purchasable gifts from someone's recent posts: extract interests, debate candidate ideas, and resolve the finalists to product listings"
)]
struct Args {
    /// Price ceiling in dollars
    #[arg(short, long, default_value_t = 30.0)]
    budget: f64,

    /// Social handle to pull recent posts from (with or without '@')
    #[arg(long)]
    handle: Option<String>,

    /// Free-form notes about the recipient
    #[arg(short, long)]
    text: Option<String>,

    /// Number of finalists to select (3 or 5)
    #[arg(long, default_value_t = 3)]
    finalists: usize,

    /// Maximum concurrent product lookups
    #[arg(long, default_value_t = 3)]
    lookup_concurrency: usize,

    /// Overall wall-clock budget for the run, in seconds
    #[arg(long, default_value_t = 1200)]
    timeout_secs: u64,

    /// Directory for per-run log files
    #[arg(long, default_value = "logs")]
    log_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    if args.budget <= 0.0 {
        bail!("--budget must be positive");
    }
    if args.finalists != 3 && args.finalists != 5 {
        bail!("--finalists must be 3 or 5");
    }

    let log = RunLog::create(&args.log_dir).await?;
    giftgenie_sdk::log_state_file!(0, log.path().display(), "Per-run log file");
    log.log(&format!(
        "Starting workflow with price ceiling: ${}",
        format_budget(args.budget)
    ))
    .await?;

    let client = GenerationClient::from_env(ClientOptions::default())
        .context("configuring generation client")?;
    let products = Arc::new(ApifyProductSource::from_env()?);

    // Seed posts from the handle when one was given; an empty result is
    // fine, the pipeline substitutes its default posts.
    let posts = match args.handle.as_deref() {
        Some(handle) => {
            log.log(&format!("Fetching recent posts for @{}", handle.trim_start_matches('@')))
                .await?;
            let posts = fetch_recent_posts(&client, handle, 10).await?;
            log.log(&format!("Retrieved {} posts", posts.len())).await?;
            posts.into_iter().map(|p| p.text).collect()
        }
        None => Vec::new(),
    };

    let input = RawInput::new(posts, args.text.clone(), args.budget);
    let config = PipelineConfig {
        finalist_target: args.finalists,
        lookup_concurrency: args.lookup_concurrency,
        deadline: Some(Duration::from_secs(args.timeout_secs)),
    };

    // Cooperative cancellation on Ctrl-C: the in-flight stage finishes,
    // then the run stops at the next checkpoint.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancellation requested; finishing the current stage...");
                cancel.cancel();
            }
        });
    }

    let result = run_gift_workflow(&config, input, client, products, Some(cancel)).await;

    log.log("").await?;
    log.log("--- Stage Trace ---").await?;
    for entry in &result.trace {
        let marker = match &entry.outcome {
            StageOutcome::Generated => "ok".to_string(),
            StageOutcome::Fallback { reason } => format!("fallback: {reason}"),
        };
        log.log(&format!(
            "[{}/{}] {}: {} ({})",
            entry.stage.index(),
            giftgenie::gift_pipeline::StageId::COUNT,
            entry.stage.name(),
            entry.detail,
            marker
        ))
        .await?;
    }

    match result.state {
        RunState::Completed => {
            log.log("").await?;
            log.log("--- Final Gift Selections ---").await?;
            for finalist in &result.finalists {
                log.log(&format!("{}: {}", finalist.idea_label, finalist.rationale))
                    .await?;
            }

            log.log("").await?;
            log.log("--- Product Listings ---").await?;
            for (keyword, listing) in result.keywords.iter().zip(&result.listings) {
                let price = listing
                    .price
                    .map(|p| format!("${p:.2}"))
                    .unwrap_or_else(|| "price unavailable".to_string());
                let stars = listing
                    .rating
                    .map(|r| "⭐".repeat(r as usize))
                    .unwrap_or_else(|| "unrated".to_string());
                log.log(&format!("Keyword: {keyword}")).await?;
                log.log(&format!("  {} | {} | {}", listing.title, price, stars))
                    .await?;
                if !listing.product_url.is_empty() {
                    log.log(&format!("  {}", listing.product_url)).await?;
                }
            }

            if result.degraded {
                log.log("").await?;
                log.log("Note: some stages used fallback data.").await?;
            }
        }
        RunState::Failed => {
            log.log("Run failed: generation backend unreachable.").await?;
        }
        RunState::Cancelled => {
            log.log("Run cancelled.").await?;
        }
        RunState::TimedOut => {
            log.log("Run exceeded its wall-clock budget.").await?;
        }
    }

    log.log(&format!("Log saved to: {}", log.path().display()))
        .await?;
    Ok(())
}
