use anyhow::Context;
use clap::Parser;
use docrag_embeddings::BatchFailurePolicy;
use docrag_ingest::{IngestionPipeline, resolve_sources};
use docrag_retrieval::Settings;
use docrag_retrieval::config::parse_url_list;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crawl documentation sites and store their embeddings.
#[derive(Debug, Parser)]
#[command(name = "docrag-ingest", version)]
struct Cli {
    /// Comma-separated source URLs; overrides DOCUSAURUS_URLS.
    #[arg(long, value_delimiter = ',')]
    urls: Option<Vec<String>>,

    /// Only report the size of the existing collection.
    #[arg(long)]
    verify_only: bool,

    /// Keep going when an embedding batch fails after the first.
    #[arg(long)]
    best_effort: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env().context("failed to load configuration")?;
    if cli.best_effort {
        settings.cohere.failure_policy = BatchFailurePolicy::BestEffort;
    }

    let pipeline =
        IngestionPipeline::from_settings(&settings).context("failed to set up ingestion")?;

    if cli.verify_only {
        let count = pipeline.verify().await?;
        info!("Collection {} holds {count} vectors", pipeline.collection());
        return Ok(());
    }

    let configured = cli
        .urls
        .map(|urls| parse_url_list(&urls.join(",")))
        .or(settings.source_urls.clone());
    let urls = resolve_sources(configured.as_deref());
    info!("Ingesting from {} source URLs", urls.len());

    match pipeline.run(&urls).await {
        Ok(report) if report.chunks_produced == 0 => {
            info!("Nothing was ingested");
            Ok(())
        }
        Ok(report) => {
            info!(
                "Ingestion completed: {} points stored in {:.2}s",
                report.points_stored,
                report.timings.total.as_secs_f64()
            );
            Ok(())
        }
        Err(err) => {
            error!("Ingestion failed: {err}");
            Err(err.into())
        }
    }
}
