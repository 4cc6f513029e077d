//! reclaim CLI: drive a refund conversation from the terminal.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use reclaim_runtime::{
    CompletionConfig, LlmEvidenceExtractor, LlmMessageComposer, LlmPolicySource,
    LlmResponseInterpreter, OpenAiProvider, RefundOrchestrator, RefundOutcome,
};

#[derive(Parser)]
#[command(name = "reclaim", about = "Refund automation agent", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draft and record a refund request for an order
    Initiate(RequestArgs),

    /// Initiate, then classify platform replies read from stdin
    Converse(RequestArgs),
}

#[derive(clap::Args)]
struct RequestArgs {
    /// Platform the order was placed on (e.g. amazon)
    #[arg(long)]
    platform: String,

    /// Order identifier used to track the conversation
    #[arg(long)]
    order_id: String,

    /// What went wrong with the order
    #[arg(long)]
    issue: String,

    /// Path to a receipt file to submit as evidence
    #[arg(long)]
    receipt: Option<PathBuf>,
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn build_orchestrator() -> Result<RefundOrchestrator> {
    let provider = Arc::new(OpenAiProvider::from_env().context("LLM provider not configured")?);
    let config = match std::env::var("RECLAIM_MODEL") {
        Ok(model) => CompletionConfig::for_model(model),
        Err(_) => CompletionConfig::default(),
    };

    Ok(RefundOrchestrator::builder()
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
        .build()?)
}

fn print_outcome(outcome: &RefundOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome)?;
    println!("{json}");
    Ok(())
}

async fn initiate(agent: &RefundOrchestrator, args: &RequestArgs) -> Result<RefundOutcome> {
    let receipt = match &args.receipt {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let outcome = agent
        .initiate_refund(
            &args.platform,
            &args.order_id,
            &args.issue,
            receipt.as_deref(),
        )
        .await;
    print_outcome(&outcome)?;
    Ok(outcome)
}

async fn converse(agent: &RefundOrchestrator, args: &RequestArgs) -> Result<()> {
    let outcome = initiate(agent, args).await?;
    if matches!(outcome, RefundOutcome::Error { .. }) {
        return Ok(());
    }

    let stdin = std::io::stdin();
    loop {
        print!("platform reply> ");
        std::io::stdout().flush()?;

        let mut reply = String::new();
        if stdin.lock().read_line(&mut reply)? == 0 {
            break;
        }
        let reply = reply.trim();
        if reply.is_empty() {
            continue;
        }

        let outcome = agent
            .handle_response(&args.order_id, reply, &args.platform)
            .await;
        print_outcome(&outcome)?;

        if outcome.is_terminal() {
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let agent = build_orchestrator()?;

    match &cli.command {
        Command::Initiate(args) => {
            initiate(&agent, args).await?;
        }
        Command::Converse(args) => {
            converse(&agent, args).await?;
        }
    }

    Ok(())
}
