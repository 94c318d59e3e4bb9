//! Query-time retrieval: embed the query, search the index, map hits back to chunks.

use serde::Serialize;

use crate::chunks::Chunk;
use crate::embed::Embedder;
use crate::error::RagError;
use crate::store::VectorIndex;

/// A retrieved chunk and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult<'a> {
    pub chunk: &'a Chunk,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RetrieveOptions {
    pub k: usize,
    /// Drop hits scoring below this. `None` keeps every top-k hit.
    pub min_score: Option<f64>,
}

impl RetrieveOptions {
    pub fn top(k: usize) -> Self {
        Self { k, min_score: None }
    }
}

/// Returns up to `k` chunks ranked by similarity to `query`.
///
/// `chunks` must be the exact sequence the index was built from: hit positions
/// are looked up directly in it.
pub async fn retrieve<'a, E, I>(
    query: &str,
    embedder: &E,
    index: &I,
    chunks: &'a [Chunk],
    options: RetrieveOptions,
) -> Result<Vec<RetrievalResult<'a>>, RagError>
where
    E: Embedder + ?Sized,
    I: VectorIndex + ?Sized,
{
    if options.k == 0 {
        return Err(RagError::invalid("k must be at least 1"));
    }
    if chunks.len() != index.len() {
        return Err(RagError::invalid(format!(
            "index holds {} vectors but {} chunks were supplied",
            index.len(),
            chunks.len()
        )));
    }
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let query_vector = embedder
        .embed_one(query)
        .await
        .map_err(RagError::embedding)?;
    let hits = index.search(&query_vector, options.k)?;

    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        let chunk = chunks.get(hit.position).ok_or_else(|| {
            RagError::invalid(format!("index returned out-of-range position {}", hit.position))
        })?;
        results.push(RetrievalResult {
            chunk,
            score: hit.score,
        });
    }
    if let Some(min) = options.min_score {
        results.retain(|r| r.score >= min);
    }

    tracing::debug!(
        k = options.k,
        hits = results.len(),
        top_score = results.first().map(|r| r.score),
        "retrieved"
    );
    Ok(results)
}
