//! Ollama client for embeddings and completion. Wraps ollama-rs with a simple API.
//!
//! Every request is bounded by the client's timeout. Dropping the returned
//! future cancels the request.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest as OllamaGenerationRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;
use thiserror::Error;

use crate::embed::{normalize, Embedder, Vector};
use crate::error::CapabilityError;
use crate::generate::{GenerationRequest, Generator};

pub const DEFAULT_EMBED_MODEL: &str = "all-minilm";
pub const DEFAULT_GENERATE_MODEL: &str = "phi3:mini";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Thin wrapper around Ollama for embedding and completion.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    inner: Ollama,
    embed_model: String,
    generate_model: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create from URL string, e.g. `http://localhost:11434`.
    pub fn from_url(url: &str) -> Result<Self, OllamaError> {
        let inner = Ollama::try_new(url).map_err(OllamaError::ParseUrl)?;
        Ok(Self {
            inner,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the embedding model (e.g. `all-minilm`, `nomic-embed-text`).
    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }

    /// Set the completion model (e.g. `phi3:mini`).
    pub fn with_generate_model(mut self, model: impl Into<String>) -> Self {
        self.generate_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    pub fn generate_model(&self) -> &str {
        &self.generate_model
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CapabilityError>
    where
        F: Future<Output = Result<T, ollama_rs::error::OllamaError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(|e| CapabilityError::from(OllamaError::Request(e))),
            Err(_) => Err(CapabilityError::Timeout(self.timeout)),
        }
    }
}

impl Default for OllamaClient {
    /// Client for `localhost:11434` with default models.
    fn default() -> Self {
        Self {
            inner: Ollama::default(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    /// Embed multiple strings in one call. Returns one normalized embedding per input.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>, CapabilityError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let req = GenerateEmbeddingsRequest::new(
            self.embed_model.clone(),
            EmbeddingsInput::Multiple(texts.to_vec()),
        );
        let res = self.bounded(self.inner.generate_embeddings(req)).await?;
        check_embeddings(res.embeddings, texts.len())
    }

    fn name(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CapabilityError> {
        let options = ModelOptions::default().temperature(request.options.temperature);
        let req = OllamaGenerationRequest::new(self.generate_model.clone(), request.prompt.clone())
            .options(options);
        let res = self.bounded(self.inner.generate(req)).await?;
        Ok(res.response)
    }

    fn name(&self) -> &str {
        &self.generate_model
    }
}

/// Checks count and shape of a batch response, then normalizes each vector.
fn check_embeddings(mut embeddings: Vec<Vector>, expected: usize) -> Result<Vec<Vector>, CapabilityError> {
    if embeddings.len() != expected {
        return Err(CapabilityError::Malformed(format!(
            "expected {expected} embeddings, got {}",
            embeddings.len()
        )));
    }
    let dim = embeddings.first().map_or(0, Vec::len);
    for v in embeddings.iter_mut() {
        if v.len() != dim {
            return Err(CapabilityError::Malformed(format!(
                "embedding dimensions differ within a batch ({dim} vs {})",
                v.len()
            )));
        }
        if !normalize(v) {
            return Err(CapabilityError::Malformed("zero or non-finite embedding".into()));
        }
    }
    Ok(embeddings)
}

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("invalid Ollama URL: {0}")]
    ParseUrl(#[from] url::ParseError),
    #[error("Ollama request failed: {0}")]
    Request(#[from] ollama_rs::error::OllamaError),
}

impl From<OllamaError> for CapabilityError {
    fn from(e: OllamaError) -> Self {
        CapabilityError::Transport(e.to_string())
    }
}
