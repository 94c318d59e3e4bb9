//! Splits documents into chunks for embedding and search.
//!
//! Sections are separated by blank lines (`"\n\n"`). Sections shorter than the
//! minimum length after trimming are dropped; they are mostly headings and
//! metadata lines. Ordinals count every section, kept or not, so ids do not
//! shift when the threshold changes.

use serde::{Deserialize, Serialize};

use crate::documents::Document;
use crate::error::RagError;

/// Default minimum characters for a section to become a chunk.
pub const DEFAULT_MIN_CHARS: usize = 100;

const SECTION_SEPARATOR: &str = "\n\n";

/// A chunk of text from a document, with source reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{stem}_{ordinal}`, unique within a corpus.
    pub id: String,
    /// File name of the originating document.
    pub source: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Sections with fewer characters than this (after trimming) are discarded.
    pub min_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
        }
    }
}

/// Chunk a single document.
pub fn chunk_document(doc: &Document, config: &ChunkerConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for (ordinal, section) in doc.text.split(SECTION_SEPARATOR).enumerate() {
        let text = section.trim();
        if text.is_empty() {
            continue;
        }
        if text.chars().count() < config.min_chars {
            tracing::trace!(source = %doc.name, ordinal, "discarding short section");
            continue;
        }
        chunks.push(Chunk {
            id: chunk_id(&doc.stem, ordinal),
            source: doc.name.clone(),
            text: text.to_string(),
        });
    }
    chunks
}

/// Chunk all documents. Returns chunks in document order, then section order.
pub fn chunk_documents(docs: &[Document], config: &ChunkerConfig) -> Vec<Chunk> {
    docs.iter().flat_map(|d| chunk_document(d, config)).collect()
}

pub fn chunk_id(stem: &str, ordinal: usize) -> String {
    format!("{stem}_{ordinal}")
}

/// Splits a chunk id back into document stem and section ordinal.
/// The ordinal follows the last `_`, so stems may themselves contain underscores.
pub fn parse_chunk_id(id: &str) -> Result<(&str, usize), RagError> {
    let (stem, ordinal) = id
        .rsplit_once('_')
        .ok_or_else(|| RagError::invalid(format!("malformed chunk id `{id}`")))?;
    if stem.is_empty() {
        return Err(RagError::invalid(format!("chunk id `{id}` has no document stem")));
    }
    let ordinal = ordinal
        .parse()
        .map_err(|_| RagError::invalid(format!("chunk id `{id}` has a non-numeric ordinal")))?;
    Ok((stem, ordinal))
}
