//! Model endpoints: text generation and embeddings.

mod ollama;

pub use ollama::OllamaClient;

use anyhow::Result;
use async_trait::async_trait;

/// Produces a completion for a single prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the model call fails.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Turns documents into dense vectors, one per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the model call fails or returns the wrong number of vectors.
    async fn embed(&self, documents: &[String]) -> Result<Vec<Vec<f32>>>;
}
