pub mod cli;
pub mod config;
pub mod enricher;
pub mod errors;
pub mod extractor;
pub mod llm;
pub mod pipeline;
pub mod sampler;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;

use crate::cli::Cli;
use crate::enricher::{ProductSearch, SerpApiSearch};
use crate::errors::AssetScanResult;
use crate::extractor::{AssetRecognizer, ScriptedRecognizer, VisionRecognizer};
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;
use crate::pipeline::{Pipeline, RunStatus};

/// Binary entry point: parses arguments, runs one pipeline, prints the priced
/// assets as JSON on stdout. Returns the process exit code.
pub async fn run() -> i32 {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match run_cli(cli).await {
        Ok(RunStatus::Completed) | Ok(RunStatus::NoFrames) => 0,
        Ok(RunStatus::Cancelled) => 130,
        Err(e) => {
            tracing::error!(error = %e, fatal = e.is_fatal(), "run aborted");
            1
        }
    }
}

async fn run_cli(cli: Cli) -> AssetScanResult<RunStatus> {
    let mut cfg = config::load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut cfg);
    cfg.validate()?;

    let recognizer: Arc<dyn AssetRecognizer> = match &cli.vision_response {
        Some(path) => {
            tracing::info!(path = %path.display(), "replaying saved vision response");
            Arc::new(ScriptedRecognizer::from_file(path)?)
        }
        None => {
            let provider = OpenAiCompatibleProvider::new(
                cfg.vision.model.clone(),
                cfg.vision.api_base.clone(),
                cfg.vision_api_key(),
            );
            let call = CallConfig {
                model: cfg.vision.model.clone(),
                stream: cfg.vision.stream,
                temperature: cfg.vision.temperature,
            };
            Arc::new(
                VisionRecognizer::new(Arc::new(provider), call)
                    .with_image_detail(cfg.vision.image_detail.clone()),
            )
        }
    };
    let search: Arc<dyn ProductSearch> = Arc::new(SerpApiSearch::new(&cfg.search, cfg.search_api_key()));

    let pipeline = Pipeline::from_config(&cfg, recognizer, search);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling outstanding work");
            let _ = cancel_tx.send(true);
        }
    });

    let report = pipeline.run(&cli.video, cancel_rx).await?;
    report.log_summary();

    if let Some(path) = &cli.report {
        report.write_json(path)?;
    }
    println!("{}", serde_json::to_string_pretty(&report.priced_assets)?);

    Ok(report.status)
}
