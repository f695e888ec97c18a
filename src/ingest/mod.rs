//! Offline ingestion: load, split, embed, index.

pub mod loader;
pub mod splitter;

use uuid::Uuid;

use crate::index::{DocChunk, DocumentIndex, IndexError};

pub use loader::{load_source, IngestError, LoadedDocument};
pub use splitter::TextSplitter;

#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents (files, pages, URLs) that produced chunks.
    pub documents: usize,
    /// Chunks stored in the index.
    pub chunks: usize,
    /// Sources that failed to load.
    pub failed_sources: usize,
}

/// Run the full pipeline over the given sources. When `reset` is set the
/// index is cleared first; otherwise new chunks are added to what is
/// already there.
pub async fn ingest_sources(
    index: &DocumentIndex,
    splitter: &TextSplitter,
    sources: &[String],
    reset: bool,
) -> Result<IngestReport, IndexError> {
    if reset {
        let dropped = index.clear().await?;
        tracing::info!("cleared {} existing chunks", dropped);
    }

    let mut report = IngestReport::default();

    for source in sources {
        let documents = match load_source(source).await {
            Ok(documents) => documents,
            Err(err) => {
                tracing::warn!("failed to load {}: {}", source, err);
                report.failed_sources += 1;
                continue;
            }
        };

        for document in documents {
            let pieces = splitter.split(&document.text);
            if pieces.is_empty() {
                continue;
            }

            let chunks: Vec<DocChunk> = pieces
                .into_iter()
                .map(|text| DocChunk {
                    id: Uuid::new_v4().to_string(),
                    text,
                    source: Some(document.source.clone()),
                    page: document.page,
                })
                .collect();

            report.documents += 1;
            report.chunks += index.add_documents(chunks).await?;
        }
    }

    tracing::info!(
        "ingestion complete: {} documents, {} chunks, {} failed sources",
        report.documents,
        report.chunks,
        report.failed_sources
    );

    Ok(report)
}
