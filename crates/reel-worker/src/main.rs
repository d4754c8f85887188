//! AutoReel pipeline binary.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_store::ArtifactStore;
use reel_worker::{BatchDriver, Collaborators, PipelineConfig, StatusRegistry};

/// Turn video URLs into captioned vertical clips.
#[derive(Debug, Parser)]
#[command(name = "autoreel", version, about)]
struct Cli {
    /// Source video URLs
    #[arg(required = true)]
    urls: Vec<String>,

    /// Artifact directory root
    #[arg(long, env = "AUTOREEL_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Maximum jobs in flight at once
    #[arg(long, env = "AUTOREEL_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Re-run stages even when their artifacts exist
    #[arg(long)]
    force: bool,

    /// Caption/transcription language
    #[arg(long, env = "AUTOREEL_LANG")]
    lang: Option<String>,

    /// Whisper model for the local transcription fallback
    #[arg(long, env = "AUTOREEL_WHISPER_MODEL")]
    whisper_model: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production.
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reel=info".parse().unwrap())
        .add_directive("reel_worker=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(max_concurrency) = cli.max_concurrency {
        config.max_concurrency = max_concurrency;
    }
    if cli.force {
        config.force = true;
    }
    if let Some(lang) = cli.lang {
        config.language = lang;
    }
    if let Some(model) = cli.whisper_model {
        config.whisper_model = model;
    }

    info!("Starting autoreel");
    info!("Pipeline config: {:?}", config);

    // Fail fast when a required tool is missing rather than mid-batch.
    for check in [
        reel_media::check_ffmpeg,
        reel_media::check_ffprobe,
        reel_media::check_ytdlp,
    ] {
        if let Err(e) = check() {
            error!("{}", e);
            std::process::exit(1);
        }
    }

    for url in &cli.urls {
        if !reel_media::download::is_supported_url(url) {
            tracing::warn!(url = %url, "Unrecognized video platform, the fetch stage may reject it");
        }
    }

    let store = ArtifactStore::new(&config.data_dir);
    let collab = Collaborators::production(config.caption_timeout_secs);
    let status = StatusRegistry::new();

    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal, finishing at next stage boundary");
        let _ = cancel_tx.send(true);
    });

    let driver = BatchDriver::new(store, config, collab, status, cancel_rx);
    let report = match driver.run(cli.urls).await {
        Ok(report) => report,
        Err(e) => {
            error!("Batch failed to run: {}", e);
            std::process::exit(1);
        }
    };

    for job in &report.jobs {
        match &job.error {
            Some(err) => println!("{}  failed  {}", job.id, err),
            None => {
                for output in job.outputs() {
                    println!("{}  {}", job.id, output.display());
                }
            }
        }
    }
    println!("{} succeeded, {} failed", report.succeeded, report.failed);

    if report.failed > 0 {
        std::process::exit(1);
    }
}
