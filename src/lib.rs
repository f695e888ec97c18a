pub mod core;
pub mod embedding;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
pub mod transcript;
