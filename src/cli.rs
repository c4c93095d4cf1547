//! Command-line interface for running the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::ports::capability::CapabilityRegistry;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::github::api::GithubApiClient;
use crate::infrastructure::github::capabilities::github_capabilities;
use crate::infrastructure::github::context::{parse_repo_reference, RepoContext};
use crate::infrastructure::llm::client::{AnthropicModelClient, ModelClientConfig};
use crate::services::{Pipeline, PipelineOutcome};

/// Generate a design document from a repository analysis.
#[derive(Debug, Parser)]
#[command(name = "blueprint", version, about)]
pub struct Cli {
    /// The design request to analyze (e.g. "Design a usage-based pricing model")
    pub query: String,

    /// GitHub repository URL (e.g. <https://github.com/owner/repo>)
    pub repo_url: String,

    /// Path to a configuration file (defaults to .blueprint/config.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output path for the generated document
    #[arg(long, default_value = "design_document.md")]
    pub output: PathBuf,

    /// Skip the pre-flight clarification question and start immediately
    #[arg(long)]
    pub no_clarification: bool,
}

/// Load config, assemble the pipeline, run it, and write the artifact.
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if cli.no_clarification {
        config.allow_clarification = false;
    }
    config.github.repository = Some(cli.repo_url.clone());

    init_tracing(&config.logging);

    let api_key = config
        .anthropic_api_key
        .clone()
        .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
        .context("No API key configured: set BLUEPRINT_ANTHROPIC_API_KEY or ANTHROPIC_API_KEY")?;
    let model = Arc::new(AnthropicModelClient::new(ModelClientConfig::new(api_key))?);

    let registry = match &config.github.token {
        Some(token) => {
            let repo = parse_repo_reference(&cli.repo_url)?;
            let context = RepoContext {
                repo,
                token: token.clone(),
            };
            let client = Arc::new(GithubApiClient::new(context));
            CapabilityRegistry::with_capabilities(github_capabilities(client))
        }
        None => {
            tracing::warn!(
                "No GitHub token configured; analyzer units will fail without capabilities"
            );
            CapabilityRegistry::empty()
        }
    };

    let pipeline = Pipeline::new(Arc::new(config), model, Arc::new(registry));

    let request = format!("{} for the repository: {}", cli.query, cli.repo_url);
    match pipeline.run(&request).await? {
        PipelineOutcome::NeedsClarification { question } => {
            println!("Clarification needed before analysis can start:\n\n{question}");
        }
        PipelineOutcome::Document { document, notes, .. } => {
            tokio::fs::write(&cli.output, &document)
                .await
                .with_context(|| format!("Failed to write {}", cli.output.display()))?;
            println!(
                "Design document written to {} ({} analysis notes)",
                cli.output.display(),
                notes.len()
            );
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber, with `RUST_LOG` taking precedence
/// over the configured level.
fn init_tracing(logging: &crate::domain::models::config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
