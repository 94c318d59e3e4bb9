//! All retrieval logic independent of how it is run (CLI or otherwise).
//!
//! Documents live in a folder the user chooses. quire builds an in-memory corpus
//! from them (chunks + vector index), retrieves the passages closest to a
//! question and asks a generator to answer from those passages only. quire
//! stores only its config in its own app data directory (see [app_data]).

pub mod app_data;
pub mod chunks;
pub mod config;
pub mod documents;
pub mod embed;
pub mod error;
pub mod generate;
pub mod index;
pub mod ollama;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod store;
pub mod watcher;

pub use app_data::app_data_dir;
pub use chunks::{chunk_document, chunk_documents, parse_chunk_id, Chunk, ChunkerConfig, DEFAULT_MIN_CHARS};
pub use config::{get_docs_root, load_config, save_config, set_docs_root, Config, ConfigError};
pub use documents::{scan_documents, Document, ScanError};
pub use embed::{Embedder, HashEmbedder, Vector};
pub use error::{Capability, CapabilityError, RagError};
pub use generate::{GenerationOptions, GenerationRequest, Generator};
pub use index::{build_index, Corpus, IndexError};
pub use ollama::{OllamaClient, OllamaError};
pub use pipeline::{Answer, Assistant, Source};
pub use prompt::{ContextComposer, PromptContext, PromptTemplate, FALLBACK_ANSWER};
pub use retriever::{retrieve, RetrievalResult, RetrieveOptions};
pub use store::{FlatIndex, Hit, VectorIndex};
pub use watcher::{watch_documents, WatchError};
