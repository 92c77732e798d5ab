use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, TextGenerator};
use crate::config::{base_url, Config};

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 500;

/// Client for an Ollama-compatible model server.
///
/// Built once at startup and shared; holds no per-request state.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: Url,
    model: String,
    embedding_model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.llm_timeout)
            .build()
            .context("failed to build LLM client")?;

        let base_url = base_url(&config.llm_base_url).context("invalid LLM base URL")?;

        Ok(Self {
            client,
            base_url,
            model: config.llm_model.clone(),
            embedding_model: config.embedding_model.clone(),
            api_key: config.llm_api_key.clone(),
        })
    }

    fn post(&self, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to build LLM URL for {path}"))?;
        let request = self.client.post(url);
        Ok(match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generation request");

        let response = self
            .post("api/generate")?
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .context("generation request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!(
                "generation endpoint returned error status {status}: {}",
                truncate(&body)
            );
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("failed to deserialize generation response")?;
        Ok(body.response)
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, documents: &[String]) -> Result<Vec<Vec<f32>>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.embedding_model, count = documents.len(), "Sending embedding request");

        let response = self
            .post("api/embed")?
            .json(&EmbedRequest {
                model: &self.embedding_model,
                input: documents,
            })
            .send()
            .await
            .context("embedding request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!(
                "embedding endpoint returned error status {status}: {}",
                truncate(&body)
            );
        }

        let body: EmbedResponse = response
            .json()
            .await
            .context("failed to deserialize embedding response")?;

        if body.embeddings.len() != documents.len() {
            return Err(anyhow!(
                "embedding endpoint returned {} vectors for {} documents",
                body.embeddings.len(),
                documents.len()
            ));
        }
        Ok(body.embeddings)
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
