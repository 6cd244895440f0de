use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use debate_agents::{personas, DebateOrchestrator, HttpCompletionService, RunnerConfig};
use orchestration::transcript::{append_run_log, write_session_snapshot};
use orchestration::{DebateConfig, SessionPhase, SummaryLength, Transcript};

fn parse_summary_length(s: &str) -> Result<SummaryLength, String> {
    match s {
        "short" => Ok(SummaryLength::Short),
        "medium" => Ok(SummaryLength::Medium),
        "detailed" => Ok(SummaryLength::Detailed),
        other => Err(format!(
            "unknown summary length '{other}' (expected short, medium, or detailed)"
        )),
    }
}

/// Multi-persona debate with recurrent summarization and final synthesis.
#[derive(Debug, Parser)]
#[command(name = "debate-agents", version)]
struct Cli {
    /// The question the personas debate.
    query: String,

    /// Comma-separated persona names, in speaking order. Defaults to the
    /// full built-in registry.
    #[arg(long, value_delimiter = ',')]
    personas: Option<Vec<String>>,

    /// Completed turns between summaries.
    #[arg(long, default_value_t = 3)]
    summary_frequency: u32,

    /// Target summary length: short, medium, or detailed.
    #[arg(long, default_value = "medium", value_parser = parse_summary_length)]
    summary_length: SummaryLength,

    /// Disable recurrent summarization.
    #[arg(long)]
    no_summarization: bool,

    /// TOML file of personas merged over the built-in registry.
    #[arg(long)]
    personas_file: Option<PathBuf>,

    /// Directory for the session snapshot and run log.
    #[arg(long)]
    transcript_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let runner = RunnerConfig::default();
    info!(endpoint = %runner.endpoint.url, model = %runner.endpoint.model, "Debate runner starting");

    let registry = personas::load_registry(cli.personas_file.as_deref())?;
    let selected = match &cli.personas {
        Some(names) => personas::resolve(&registry, names)?,
        None => registry.clone(),
    };

    let config = DebateConfig::new(
        !cli.no_summarization,
        cli.summary_frequency,
        cli.summary_length,
    );

    let service = HttpCompletionService::new(runner.endpoint.clone(), runner.request_timeout)?;
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received — cancelling after the in-flight call");
            ctrl_c_cancel.cancel();
        }
    });

    let session = DebateOrchestrator::new(Arc::new(service), runner)
        .with_cancellation(cancel)
        .run(&cli.query, selected, config)
        .await?;

    let transcript = Transcript::from_session(&session);
    println!("{}", transcript.render());
    println!("\n{}", session.metrics.report());

    if let Some(dir) = &cli.transcript_out {
        std::fs::create_dir_all(dir)?;
        write_session_snapshot(&session, dir);
        append_run_log(&session, dir);
    }

    if session.phase == SessionPhase::Failed {
        bail!(
            "debate failed: {}",
            session
                .failure
                .map(|f| f.to_string())
                .unwrap_or_else(|| "unknown failure".into())
        );
    }
    Ok(())
}
