// Gift suggestion pipeline module
pub mod gift_pipeline;

// Marketplace product lookup adapter
pub mod marketplace;

// Per-run log file sink
pub mod run_log;

// Social post retrieval
pub mod social;

// Shared stage utilities
pub mod workflow_utils;
