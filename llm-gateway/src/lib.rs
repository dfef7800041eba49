//! Typed chat-completion client for OpenAI-compatible backends.
//!
//! The crate exposes three layers:
//! - [`types`]: request/response structures and client options;
//! - [`backend`]: the [`CompletionBackend`] trait seam plus the
//!   production HTTP adapter;
//! - [`client`]: [`GenerationClient`], the retrying handle pipelines
//!   hold for the lifetime of a run.
//!
//! Only backend unavailability surfaces as an error; the shape of the
//! returned text is the caller's problem by design.

pub mod backend;
pub mod client;
pub mod error;
pub mod types;

pub use backend::{CompletionBackend, OpenAiBackend};
pub use client::GenerationClient;
pub use error::{ErrorContext, GatewayError};
pub use types::{
    ClientOptions, ClientOptionsBuilder, CompletionRequest, CompletionResponse, Message, Role,
    ToolSpec,
};
