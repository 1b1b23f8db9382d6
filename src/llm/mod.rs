//! Advice generation: the enrichment seam and its OpenRouter-backed client.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

pub use client::OpenRouterClient;

#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Model returned no usable text")]
    EmptyReply,
}

/// The language-model collaborator, reduced to the one call the executor
/// makes when a frustration trigger needs text.
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    /// One short comforting sentence for a frustrated developer.
    async fn comfort_phrase(&self) -> Result<String, AdviceError>;
}
