//! Completion provider abstractions and implementations.
//!
//! The engine treats the language model as an opaque text-completion
//! function behind [`CompletionProvider`], so the Gemini backend and the
//! canned test provider are interchangeable.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use mock::MockCompletionProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Result of a completion call.
#[derive(Debug)]
pub struct ProviderResponse {
    /// Generated text, if the payload carried one.
    pub text: Option<String>,

    /// Full decoded provider payload, kept opaque for diagnostics.
    pub raw: serde_json::Value,
}

/// A single-endpoint text-completion function.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete the given prompt.
    async fn complete(&self, prompt: &str) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
