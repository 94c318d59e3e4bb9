//! Index pipeline: scan → chunk → embed → build. Produces an immutable corpus snapshot.
//!
//! A corpus is never updated in place. Rebuilding creates a new [`Corpus`];
//! readers holding the old one (behind an `Arc`) are unaffected.

use std::path::Path;

use crate::chunks::{chunk_documents, parse_chunk_id, Chunk, ChunkerConfig};
use crate::documents::{scan_documents, Document, ScanError};
use crate::embed::Embedder;
use crate::error::{CapabilityError, RagError};
use crate::retriever::{retrieve, RetrievalResult, RetrieveOptions};
use crate::store::{FlatIndex, VectorIndex};

/// Chunks of one document snapshot plus the index built from their embeddings.
/// Index position `i` always refers to `chunks[i]`.
#[derive(Debug)]
pub struct Corpus {
    chunks: Vec<Chunk>,
    index: FlatIndex,
}

impl Corpus {
    /// Chunks and embeds `documents`. Fails with [`RagError::EmptyCorpus`] when no
    /// chunk survives, so a corpus always has something to search.
    #[tracing::instrument(skip_all, fields(documents = documents.len(), embedder = embedder.name()))]
    pub async fn build<E>(
        documents: &[Document],
        embedder: &E,
        chunker: &ChunkerConfig,
    ) -> Result<Self, RagError>
    where
        E: Embedder + ?Sized,
    {
        let chunks = chunk_documents(documents, chunker);
        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed(&texts).await.map_err(RagError::embedding)?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::embedding(CapabilityError::Malformed(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            ))));
        }
        let index = FlatIndex::build(embeddings)?;

        tracing::info!(chunks = chunks.len(), dim = index.dim(), "corpus built");
        Ok(Self { chunks, index })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Looks up a chunk by its `{stem}_{ordinal}` id.
    pub fn chunk_by_id(&self, id: &str) -> Result<Option<&Chunk>, RagError> {
        parse_chunk_id(id)?;
        Ok(self.chunks.iter().find(|c| c.id == id))
    }

    /// Top-k chunks for `query`, see [`retrieve`].
    pub async fn retrieve<E>(
        &self,
        query: &str,
        embedder: &E,
        options: RetrieveOptions,
    ) -> Result<Vec<RetrievalResult<'_>>, RagError>
    where
        E: Embedder + ?Sized,
    {
        retrieve(query, embedder, &self.index, &self.chunks, options).await
    }
}

/// Runs the full pipeline over the markdown files in `root`.
pub async fn build_index<E>(
    root: &Path,
    embedder: &E,
    chunker: &ChunkerConfig,
) -> Result<Corpus, IndexError>
where
    E: Embedder + ?Sized,
{
    let documents = scan_documents(root)?;
    Ok(Corpus::build(&documents, embedder, chunker).await?)
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Build(#[from] RagError),
}
