//! Narrator HTTP server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use narrator_core::{NarratorConfig, SynthesizerBackend, UiMode};
use narrator_runtime::logging::init_logging_from_config;
use narrator_server::NarratorServer;

/// Narrator: generate and delete cloned-voice audio from a browser form
#[derive(Debug, Parser)]
#[command(name = "narrator-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Form variant: single or stateful
    #[arg(long)]
    ui: Option<UiMode>,

    /// Synthesizer backend: command or tone
    #[arg(long)]
    backend: Option<SynthesizerBackend>,

    /// Directory for generated audio
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn load_config(&self) -> Result<NarratorConfig> {
        let mut config = match &self.config {
            Some(path) => NarratorConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => NarratorConfig::default(),
        };

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ui) = self.ui {
            config.server.ui = ui;
        }
        if let Some(backend) = self.backend {
            config.synthesizer.backend = backend;
        }
        if let Some(dir) = &self.output_dir {
            config.workflow.output_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.format = "json".to_string();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    init_logging_from_config(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.bind_addr(),
        output_dir = %config.workflow.output_dir.display(),
        "Starting Narrator server"
    );

    let server = NarratorServer::new(&config).context("Failed to create server")?;

    server.run().await.context("Server failed")?;

    info!("Server shutdown complete");
    Ok(())
}
