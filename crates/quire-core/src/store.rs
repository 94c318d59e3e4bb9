//! In-memory vector index over chunk embeddings. Brute-force inner-product scan.
//! No persistence; the index is discarded when the process exits.
//!
//! Vectors are expected to be unit length, so the inner product is the cosine
//! similarity. The index does not re-normalize; feeding it non-unit vectors gives
//! well-defined but meaningless scores.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::embed::Vector;
use crate::error::RagError;

/// Scans larger than this are split into shards and scored in parallel.
const SHARD_SIZE: usize = 4096;

/// A search hit: position of the vector in build order, and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub position: usize,
    pub score: f64,
}

/// Nearest-neighbour search over vectors of one dimensionality.
///
/// Positions are the build order of the vectors. They are only meaningful
/// against the sequence the index was built from and must not be stored.
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top `min(k, len)` hits by descending score, ties by ascending position.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, RagError>;
}

/// Exact index: scores every stored vector. Immutable once built.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Vector>,
}

impl FlatIndex {
    /// Builds an index over `vectors`, which must be non-empty and share one dimensionality.
    pub fn build(vectors: Vec<Vector>) -> Result<Self, RagError> {
        let dim = vectors.first().map(Vec::len).ok_or(RagError::EmptyCorpus)?;
        if dim == 0 {
            return Err(RagError::invalid("vectors must have at least one dimension"));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(RagError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }
        Ok(Self { dim, vectors })
    }

    fn scan(&self, query: &[f32], offset: usize, vectors: &[Vector], k: usize) -> Vec<Hit> {
        let hits = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| Hit {
                position: offset + i,
                score: dot(query, v),
            })
            .collect();
        top_k(hits, k)
    }
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, RagError> {
        if k == 0 {
            return Err(RagError::invalid("k must be at least 1"));
        }
        if query.len() != self.dim {
            return Err(RagError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        if self.vectors.len() <= SHARD_SIZE {
            return Ok(self.scan(query, 0, &self.vectors, k));
        }
        // Each score is computed the same way in every shard, and the merge
        // uses the same total order, so the result matches a sequential scan.
        let candidates: Vec<Hit> = self
            .vectors
            .par_chunks(SHARD_SIZE)
            .enumerate()
            .map(|(shard, vectors)| self.scan(query, shard * SHARD_SIZE, vectors, k))
            .flatten_iter()
            .collect();
        Ok(top_k(candidates, k))
    }
}

/// Inner product accumulated in f64, always in element order.
fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

fn rank(a: &Hit, b: &Hit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.position.cmp(&b.position))
}

fn top_k(mut hits: Vec<Hit>, k: usize) -> Vec<Hit> {
    if hits.len() > k {
        hits.select_nth_unstable_by(k - 1, rank);
        hits.truncate(k);
    }
    hits.sort_unstable_by(rank);
    hits
}
