//! taxonyx-llm — Oracle backend abstraction layer.
//! Implements the CompletionBackend trait for the four supported
//! providers and the retrying OracleClient wrapper on top of them.

pub mod backend;
pub mod client;

pub use backend::{
    AnthropicBackend, CompletionBackend, CompletionRequest, CompletionResponse, GeminiBackend,
    Message, OllamaBackend, OpenAiBackend, OracleError,
};
pub use client::{Completion, OracleClient, OracleSettings, UsageSnapshot, UsageStats};
