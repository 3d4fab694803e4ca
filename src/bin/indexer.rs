//! Batch indexing entry point: index a manifest file into the vector store
//! and write a copy annotated with the search-service descriptor.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iiif_visual_search::{
    core::Config,
    indexer::{HttpImageFetcher, Indexer},
    manifest::{KeywordClassifier, Manifest},
    models::SiglipEmbedder,
    storage::QdrantStore,
};

#[derive(Debug, Parser)]
#[command(name = "indexer", about = "Index IIIF manifest images into Qdrant")]
struct Args {
    /// Path to the input manifest.json
    manifest: PathBuf,

    /// Path to the output manifest
    #[arg(long, default_value = "manifest_with_search.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let json = tokio::fs::read_to_string(&args.manifest).await?;
    let manifest = Manifest::parse(&json)?;

    let embedder = Arc::new(SiglipEmbedder::new(&config.model));
    tracing::info!(model = %config.model.model_name, "Loading SigLIP model");
    embedder.warm_up().await?;

    let store = Arc::new(QdrantStore::new(&config.qdrant)?);
    let fetcher = Arc::new(HttpImageFetcher::new(config.indexing.fetch_timeout)?);
    let classifier = Arc::new(KeywordClassifier::new(&config.indexing.keyword));

    let indexer = Indexer::new(
        embedder,
        store,
        fetcher,
        classifier,
        config.indexing.batch_size,
        &config.server.public_url,
    );

    let outcome = indexer.run(manifest).await?;

    let output = serde_json::to_string_pretty(&outcome.manifest)?;
    tokio::fs::write(&args.output, output).await?;

    tracing::info!(
        points = outcome.points_indexed,
        output = %args.output.display(),
        "Indexed manifest saved"
    );
    Ok(())
}
