//! Question answering over a built corpus: retrieve → compose → generate.

use std::sync::Arc;

use serde::Serialize;

use crate::chunks::ChunkerConfig;
use crate::documents::Document;
use crate::embed::Embedder;
use crate::error::RagError;
use crate::generate::{GenerationOptions, GenerationRequest, Generator};
use crate::index::Corpus;
use crate::prompt::{ContextComposer, PromptContext};
use crate::retriever::RetrieveOptions;

/// Where an answer's context came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub chunk_id: String,
    pub source: String,
    pub score: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Generator output, as returned. May be the fallback sentence.
    pub text: String,
    pub sources: Vec<Source>,
    /// Prompt the generator was given.
    pub prompt: String,
}

/// Owns the providers and the current corpus snapshot.
pub struct Assistant<E, G> {
    corpus: Arc<Corpus>,
    embedder: E,
    generator: G,
    composer: ContextComposer,
    retrieve: RetrieveOptions,
    generation: GenerationOptions,
}

impl<E, G> Assistant<E, G>
where
    E: Embedder,
    G: Generator,
{
    pub fn new(corpus: Arc<Corpus>, embedder: E, generator: G) -> Self {
        Self {
            corpus,
            embedder,
            generator,
            composer: ContextComposer::default(),
            retrieve: RetrieveOptions::top(3),
            generation: GenerationOptions::default(),
        }
    }

    pub fn with_composer(mut self, composer: ContextComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_retrieve_options(mut self, options: RetrieveOptions) -> Self {
        self.retrieve = options;
        self
    }

    pub fn with_generation_options(mut self, options: GenerationOptions) -> Self {
        self.generation = options;
        self
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Swaps in a rebuilt corpus. Callers still holding the previous `Arc` keep using it.
    pub fn replace_corpus(&mut self, corpus: Arc<Corpus>) -> Arc<Corpus> {
        std::mem::replace(&mut self.corpus, corpus)
    }

    /// Builds a new corpus from `documents` with this assistant's embedder and
    /// swaps it in, returning the previous one. On failure the current corpus stays.
    #[tracing::instrument(skip_all, fields(documents = documents.len()))]
    pub async fn rebuild(
        &mut self,
        documents: &[Document],
        chunker: &ChunkerConfig,
    ) -> Result<Arc<Corpus>, RagError> {
        let fresh = Corpus::build(documents, &self.embedder, chunker).await?;
        Ok(self.replace_corpus(Arc::new(fresh)))
    }

    /// Retrieves and composes without calling the generator.
    pub async fn prepare(&self, query: &str) -> Result<(PromptContext, Vec<Source>), RagError> {
        let results = self
            .corpus
            .retrieve(query, &self.embedder, self.retrieve)
            .await?;
        let context = self.composer.compose(query, &results);
        let sources = results
            .iter()
            .map(|r| Source {
                chunk_id: r.chunk.id.clone(),
                source: r.chunk.source.clone(),
                score: r.score,
                text: r.chunk.text.clone(),
            })
            .collect();
        Ok((context, sources))
    }

    /// Answers `query` from the corpus. Any failure is returned as an error,
    /// never disguised as an answer.
    #[tracing::instrument(skip(self), fields(generator = self.generator.name()))]
    pub async fn ask(&self, query: &str) -> Result<Answer, RagError> {
        let (context, sources) = self.prepare(query).await?;
        let request = GenerationRequest::new(context.prompt, self.generation)?;
        let text = self
            .generator
            .generate(&request)
            .await
            .map_err(RagError::generation)?;
        tracing::debug!(sources = sources.len(), chars = text.len(), "answered");
        Ok(Answer {
            text,
            sources,
            prompt: request.prompt,
        })
    }
}
