pub mod client;
pub mod prompts;
pub mod summarizer;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{AiClient, AiConfig};
pub use prompts::Locale;
pub use summarizer::{Summarize, Summarizer};

/// A two-message chat exchange sent to the text-generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// One chat-style completion per call; no retries.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
