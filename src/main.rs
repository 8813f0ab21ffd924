use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use sentinel_review::config::{EngineConfig, ServerConfig};
use sentinel_review::engine::dify::DifyReviewEngine;
use sentinel_review::engine::{FileUpload, ReviewEngine};
use sentinel_review::logging;
use sentinel_review::photo::guess_mime;
use sentinel_review::review::{BatchReviewRequest, SingleReviewRequest, run_batch};
use sentinel_review::server;

#[derive(Parser)]
#[command(name = "sentinel", version, about = "Review proxy in front of a Dify workflow.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP proxy (default)
    Serve {
        /// Address to listen on (overrides SENTINEL_ADDR)
        #[arg(short, long)]
        bind: Option<String>,

        /// Pause after each successful batch item, in milliseconds
        #[arg(long)]
        batch_delay_ms: Option<u64>,
    },
    /// Submit a single item straight to the workflow and print the outputs
    Review {
        #[arg(long)]
        id: Option<String>,

        /// Text to review
        #[arg(short, long)]
        text: Option<String>,

        /// Photo as a URL, local path or data URI
        #[arg(short, long)]
        photo: Option<String>,

        /// Local file sent as a multipart upload (takes priority over --photo)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Run a batch from a JSON file (`{"items": [...]}` or a bare array)
    Batch {
        path: PathBuf,

        /// Pause after each successful item, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let command = cli.command.unwrap_or(Command::Serve {
        bind: None,
        batch_delay_ms: None,
    });

    let engine = Arc::new(DifyReviewEngine::new(EngineConfig::from_env()?)?);
    tracing::debug!(base_url = %engine.config().base_url, "engine configured");

    match command {
        Command::Serve {
            bind,
            batch_delay_ms,
        } => {
            let mut config = ServerConfig::from_env();
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(ms) = batch_delay_ms {
                config.batch_delay = Duration::from_millis(ms);
            }
            server::run(&config, engine).await
        }
        Command::Review {
            id,
            text,
            photo,
            file,
        } => {
            let payload = SingleReviewRequest { id, text, photo }.into_payload();
            let upload = match file {
                Some(path) => Some(read_upload(&path).await?),
                None => None,
            };
            let outputs = engine.submit(&payload, upload).await?;
            println!("{}", serde_json::to_string_pretty(&outputs)?);
            Ok(())
        }
        Command::Batch { path, delay_ms } => {
            let items = read_batch_file(&path).await?;
            let delay = delay_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| ServerConfig::from_env().batch_delay);
            let results = run_batch(engine.as_ref(), items, delay).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
    }
}

async fn read_upload(path: &Path) -> anyhow::Result<FileUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path.file_name().and_then(|n| n.to_str());
    Ok(FileUpload::new(filename, Some(guess_mime(path)), bytes))
}

async fn read_batch_file(path: &Path) -> anyhow::Result<Vec<SingleReviewRequest>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let body: Value = serde_json::from_str(&raw).context("batch file is not valid JSON")?;
    if body.is_array() {
        return serde_json::from_value(body).context("batch file has malformed items");
    }
    Ok(BatchReviewRequest::from_json(&body)?.items)
}
