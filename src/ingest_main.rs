use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use groundcrew::core::paths::AppPaths;
use groundcrew::core::settings::Settings;
use groundcrew::embedding::build_embedder;
use groundcrew::index::{DocumentIndex, SqliteVectorStore};
use groundcrew::ingest::{ingest_sources, TextSplitter};
use groundcrew::logging;

/// Load documents into the retrieval index.
#[derive(Debug, Parser)]
#[command(name = "groundcrew-ingest", version, about)]
struct Cli {
    /// File, directory, or http(s) URL to ingest (repeatable).
    #[arg(long = "source", value_name = "DIR_OR_URL", required = true)]
    sources: Vec<String>,

    /// Drop every indexed chunk before ingesting.
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::from_env().context("invalid configuration")?;
    let paths = AppPaths::new();
    logging::init(&paths.log_dir);

    let store = Arc::new(
        SqliteVectorStore::with_path(paths.index_db_path.clone())
            .await
            .context("failed to open index database")?,
    );
    let embedder = build_embedder(&settings);
    let index = DocumentIndex::new(store, embedder);
    let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap);

    let report = ingest_sources(&index, &splitter, &cli.sources, cli.reset)
        .await
        .context("ingestion failed")?;

    println!(
        "Indexed {} chunks from {} documents ({} sources failed)",
        report.chunks, report.documents, report.failed_sources
    );

    Ok(())
}
