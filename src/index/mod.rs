//! Persistent chunk index with similarity search.

pub mod manager;
pub mod sqlite;
pub mod store;

pub use manager::DocumentIndex;
pub use sqlite::SqliteVectorStore;
pub use store::{DocChunk, IndexError, ScoredChunk, VectorStore};
