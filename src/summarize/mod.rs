//! Turning a cluster of posts into a category label and pain-point summary.

mod parse;

pub use parse::{EmbeddedJson, LinePrefix, ParserChain, ResponseParser, StrictJson};

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::llm::TextGenerator;
use crate::models::CategorySummary;

/// Summarizes the documents of one cluster.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the model could not be reached. Unparseable output
    /// is not an error; it yields placeholder text.
    async fn summarize(&self, documents: &[String]) -> Result<CategorySummary>;
}

/// Build the prompt for one cluster.
#[must_use]
pub fn build_prompt(documents: &[String]) -> String {
    let posts = documents.join("\n");
    format!(
        r#"Based on these related posts, identify the common pain point or problem these users are experiencing.

Posts:
{posts}

You must respond in valid JSON format with exactly these fields:
{{
  "category": "A category name that best describes these related issues",
  "pain_points": "2-4 sentences summarizing the shared problems"
}}
Do not include any other text, explanations, or formatting in your response.
There should be only one category and one pain point."#
    )
}

/// Summarizer backed by a text-generation model, one call per cluster.
pub struct LlmSummarizer {
    generator: Arc<dyn TextGenerator>,
    parsers: ParserChain,
}

impl LlmSummarizer {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            parsers: ParserChain::default(),
        }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, documents: &[String]) -> Result<CategorySummary> {
        let prompt = build_prompt(documents);
        let response = self.generator.generate(&prompt).await?;

        let (summary, parser) = self.parsers.parse(response.trim());
        debug!(parser, category = %summary.category(), "Parsed cluster summary");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::bail;

    use crate::constants::{FALLBACK_CATEGORY, FALLBACK_PAIN_POINTS};

    struct CannedGenerator {
        response: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    struct DownGenerator;

    #[async_trait]
    impl TextGenerator for DownGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            bail!("connection refused")
        }
    }

    #[test]
    fn test_prompt_joins_documents() {
        let prompt = build_prompt(&["first post".to_string(), "second post".to_string()]);
        assert!(prompt.contains("first post\nsecond post"));
        assert!(prompt.contains("\"category\""));
        assert!(prompt.contains("\"pain_points\""));
    }

    #[tokio::test]
    async fn test_summarize_json_response() {
        let generator = Arc::new(CannedGenerator::new(
            "  {\"category\": \"Slow app\", \"pain_points\": \"Users report lag.\"}\n",
        ));
        let summarizer = LlmSummarizer::new(generator.clone());

        let summary = summarizer.summarize(&["laggy".to_string()]).await.unwrap();

        assert_eq!(summary.category(), "Slow app");
        assert_eq!(summary.pain_points(), "Users report lag.");
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_category_falls_back_to_placeholder() {
        let generator = Arc::new(CannedGenerator::new(r#"{"category": "", "pain_points": "ok"}"#));
        let summary = LlmSummarizer::new(generator)
            .summarize(&["x".to_string()])
            .await
            .unwrap();

        assert_eq!(summary.category(), FALLBACK_CATEGORY);
        assert_eq!(summary.pain_points(), FALLBACK_PAIN_POINTS);
    }

    #[tokio::test]
    async fn test_generation_failure_is_error() {
        let summarizer = LlmSummarizer::new(Arc::new(DownGenerator));
        assert!(summarizer.summarize(&["x".to_string()]).await.is_err());
    }
}
