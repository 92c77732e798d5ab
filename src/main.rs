use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forum_pain_points::analysis::Analyzer;
use forum_pain_points::clustering::{Clusterer, EmbeddingTopicModel};
use forum_pain_points::config::Config;
use forum_pain_points::forums::RedditClient;
use forum_pain_points::llm::OllamaClient;
use forum_pain_points::summarize::LlmSummarizer;
use forum_pain_points::web;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting forum-pain-points");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        llm_base_url = %config.llm_base_url,
        llm_model = %config.llm_model,
        embedding_model = %config.embedding_model,
        "Configuration loaded"
    );

    if config.reddit_client_id.is_none() || config.reddit_client_secret.is_none() {
        warn!("Reddit credentials not configured - requests that need Reddit will fail");
    }

    // Model handles live for the whole process and are never rebuilt
    let reddit = RedditClient::new(&config).context("Failed to initialize Reddit client")?;
    let ollama = Arc::new(OllamaClient::new(&config).context("Failed to initialize LLM client")?);

    let topic_model = EmbeddingTopicModel::new(
        ollama.clone(),
        config.min_topic_size,
        config.min_samples,
    );
    let analyzer = Analyzer::new(
        Arc::new(reddit),
        Clusterer::new(Arc::new(topic_model), config.min_cluster_documents),
        Arc::new(LlmSummarizer::new(ollama)),
        config.search_query.clone(),
    );

    web::serve(&config, Arc::new(analyzer), shutdown_signal()).await?;

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forum_pain_points=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down...");
}
