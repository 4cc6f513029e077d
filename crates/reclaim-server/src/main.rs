//! reclaim-server binary: HTTP front end for the refund agent.

mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};

use reclaim_runtime::{
    CompletionConfig, LlmEvidenceExtractor, LlmMessageComposer, LlmPolicySource,
    LlmResponseInterpreter, OpenAiProvider, RefundOrchestrator,
};

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn build_orchestrator() -> Result<RefundOrchestrator> {
    let provider = Arc::new(OpenAiProvider::from_env().context("LLM provider not configured")?);
    let config = match std::env::var("RECLAIM_MODEL") {
        Ok(model) => CompletionConfig::for_model(model),
        Err(_) => CompletionConfig::default(),
    };

    let orchestrator = RefundOrchestrator::builder()
        .policy_source(Arc::new(LlmPolicySource::new(
            provider.clone(),
            config.clone(),
        )))
        .evidence_extractor(Arc::new(LlmEvidenceExtractor::new(
            provider.clone(),
            config.clone(),
        )))
        .message_composer(Arc::new(LlmMessageComposer::new(
            provider.clone(),
            config.clone(),
        )))
        .response_interpreter(Arc::new(LlmResponseInterpreter::new(provider, config)))
        .build()?;

    Ok(orchestrator)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let orchestrator = Arc::new(build_orchestrator()?);
    let app = routes::router(orchestrator);

    let address =
        std::env::var("RECLAIM_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(%address, "reclaim-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    tracing::info!("reclaim-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
