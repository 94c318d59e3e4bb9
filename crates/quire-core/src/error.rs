//! Error kinds shared by the retrieval pipeline.
//!
//! Build errors abort corpus construction. Query errors are scoped to the query
//! that raised them; the built corpus is immutable and stays usable.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,
    #[error("dimension mismatch: index has {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{capability} failed: {source}")]
    Capability {
        capability: Capability,
        #[source]
        source: CapabilityError,
    },
}

impl RagError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        RagError::InvalidArgument(msg.into())
    }

    pub fn embedding(source: CapabilityError) -> Self {
        RagError::Capability {
            capability: Capability::Embedding,
            source,
        }
    }

    pub fn generation(source: CapabilityError) -> Self {
        RagError::Capability {
            capability: Capability::Generation,
            source,
        }
    }
}

/// Which external collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Embedding,
    Generation,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Embedding => f.write_str("embedding"),
            Capability::Generation => f.write_str("generation"),
        }
    }
}

/// Failure reported by an embedding or generation provider.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Malformed(String),
}
