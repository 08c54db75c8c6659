//! Language model access.
//!
//! The translator only needs "prompt in, text out", so the completion
//! endpoint sits behind the `CompletionClient` trait. `GeminiClient` is the
//! production implementation; tests substitute their own.

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

use crate::error::InsightResult;
use async_trait::async_trait;

/// A single-shot text completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one prompt and return the generated text.
    async fn complete(&self, prompt: &str) -> InsightResult<String>;

    /// Identifier of the model answering requests.
    fn model(&self) -> &str;
}
