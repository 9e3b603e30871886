//! Semantic knowledge store for manufacturing telemetry and documentation.
//!
//! Wraps an external embedding service and a vector similarity index into
//! named collections. Every operation degrades to a safe no-op when either
//! collaborator is unavailable: callers must tolerate an entirely absent
//! knowledge store.

pub mod docs;
pub mod embedding;
pub mod index;
pub mod store;
mod text;

pub use embedding::{EmbeddingError, EmbeddingService, HttpEmbeddingService, MockEmbeddingService};
pub use index::{
    ChromaIndex, IndexError, IndexMatch, IndexedDocument, MemoryIndex, StoredDocument, VectorIndex,
};
pub use store::{KnowledgeStore, RecentSummary, COLLECTIONS};
pub use text::format_data_as_text;
