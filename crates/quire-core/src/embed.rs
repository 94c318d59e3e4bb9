//! Embedding capability: text in, unit-length vectors out.
//!
//! Providers own the normalization invariant. The index scores by inner
//! product and never re-normalizes on their behalf.

use std::hash::Hasher;

use async_trait::async_trait;
use twox_hash::XxHash64;

use crate::error::CapabilityError;

/// Fixed-length, L2-normalized embedding.
pub type Vector = Vec<f32>;

/// Anything that maps text to vectors of one fixed dimensionality.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch. Returns exactly one unit vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>, CapabilityError>;

    /// Provider name for logging.
    fn name(&self) -> &str;

    async fn embed_one(&self, text: &str) -> Result<Vector, CapabilityError> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::Malformed("no embedding returned".into()))
    }
}

/// Scales `v` to unit length in place. Returns `false` (leaving `v` untouched)
/// for zero or non-finite vectors, which cannot be normalized.
pub fn normalize(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if !norm.is_finite() || norm <= 0.0 {
        return false;
    }
    for x in v.iter_mut() {
        *x = (f64::from(*x) / norm) as f32;
    }
    true
}

pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt()
}

/// Default dimensionality of [`HashEmbedder`].
pub const DEFAULT_HASH_DIM: usize = 384;

/// Deterministic offline embedder: hashes lowercase word tokens into a fixed
/// number of buckets and normalizes the counts. Texts sharing words score
/// higher. Useful for tests and for running without a model server.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        (hasher.finish() % self.dim as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vector {
        let mut v = vec![0f32; self.dim];
        let mut any = false;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            v[self.bucket(&token.to_lowercase())] += 1.0;
            any = true;
        }
        if !any {
            // Texts without words still need a unit vector.
            v[self.bucket("")] = 1.0;
        }
        normalize(&mut v);
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIM)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>, CapabilityError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn hash_vectors_are_unit_length() {
        let e = HashEmbedder::default();
        let texts: Vec<String> = ["", "   ", "one", "Many words, with punctuation!", "ünïcödé text"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for v in e.embed(&texts).await.unwrap() {
            assert_eq!(v.len(), DEFAULT_HASH_DIM);
            assert!((l2_norm(&v) - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn shared_words_score_higher() {
        let e = HashEmbedder::new(1024);
        let q = e.embed_one("payment schedule").await.unwrap();
        let near = e.embed_one("The payment schedule is staged").await.unwrap();
        let far = e.embed_one("Roof tiles come in three colours").await.unwrap();
        assert!(dot(&q, &near) > dot(&q, &far));
    }

    #[tokio::test]
    async fn same_text_same_vector() {
        let e = HashEmbedder::default();
        let a = e.embed_one("Case Insensitive").await.unwrap();
        let b = e.embed_one("case insensitive").await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn normalize_rejects_zero() {
        let mut v = vec![0.0, 0.0];
        assert!(!normalize(&mut v));
        let mut v = vec![3.0, 4.0];
        assert!(normalize(&mut v));
        assert!((v[0] - 0.6).abs() < 1e-6 && (v[1] - 0.8).abs() < 1e-6);
    }
}
