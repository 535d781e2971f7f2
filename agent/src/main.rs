use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use docrag_agent::{
    ChatCompletionsClient, DocumentationAgent, RetrieveDocumentationTool, run_console,
};
use docrag_retrieval::{RetrievalEngine, Settings, run_quality_check};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Ask the documentation assistant questions from the terminal.
#[derive(Debug, Parser)]
#[command(name = "docrag-chat", version)]
struct Cli {
    /// Run the retrieval quality checks against the collection and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they do not interleave with the conversation.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("failed to load configuration")?;
    let engine = Arc::new(
        RetrievalEngine::from_settings(&settings).context("failed to set up retrieval")?,
    );

    if cli.check {
        let checks = run_quality_check(&engine).await;
        let failed = checks.iter().filter(|check| check.outcome.is_err()).count();
        anyhow::ensure!(failed == 0, "{failed} retrieval check(s) failed");
        return Ok(());
    }

    let client =
        ChatCompletionsClient::from_settings(&settings.agent).context("failed to set up agent")?;
    let agent = DocumentationAgent::new(Arc::new(client))
        .with_tool(Arc::new(RetrieveDocumentationTool::new(engine)));
    info!("Agent is ready! Type 'quit' or 'exit' to end the session.");

    let mut stdout = tokio::io::stdout();
    let summary = run_console(&agent, BufReader::new(tokio::io::stdin()), &mut stdout).await?;
    info!(
        "Session ended: {} answered, {} failed",
        summary.answered, summary.failed
    );
    Ok(())
}
