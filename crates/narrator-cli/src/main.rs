//! Narrator command-line interface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use narrator_core::SynthesizerBackend;
use narrator_runtime::logging::{LOG_FORMAT_ENV, LogFormat, init_logging, resolve_format};

mod commands;

/// Narrator: generate and delete cloned-voice audio files
#[derive(Debug, Parser)]
#[command(name = "narrator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (defaults to the config file's level)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log format (json or text)
    #[arg(long, global = true)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Json,
    Text,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synthesize text to a WAV file
    Synth {
        /// Input text or file path (use @file.txt for file input)
        input: String,

        /// Output file path; defaults to a unique name in the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base name for the generated file
        #[arg(short, long, default_value = "")]
        base_name: String,

        /// Speaking-rate multiplier
        #[arg(long)]
        speed: Option<f32>,

        /// Language code (en, de, zh-cn, ...)
        #[arg(long)]
        language: Option<String>,

        /// Reference voice sample to clone
        #[arg(long)]
        reference_voice: Option<PathBuf>,

        /// Synthesizer backend: command or tone
        #[arg(long)]
        backend: Option<SynthesizerBackend>,

        /// Pass the text to the model without sentence splitting
        #[arg(long)]
        no_split: bool,
    },

    /// Delete a generated file
    Delete {
        /// Path returned by synth
        path: String,
    },

    /// Print the path a new file would get
    Name {
        /// Base name (blank uses the default)
        #[arg(default_value = "")]
        base: String,
    },

    /// Show version and configuration info
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let format = match cli.log_format {
        Some(LogFormatArg::Json) => LogFormat::Json,
        Some(LogFormatArg::Text) => LogFormat::Text,
        None => {
            let env_value = std::env::var(LOG_FORMAT_ENV).ok();
            resolve_format(&config.logging.format, env_value.as_deref()).0
        }
    };
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, format);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Narrator CLI");

    match cli.command {
        Commands::Synth {
            input,
            output,
            base_name,
            speed,
            language,
            reference_voice,
            backend,
            no_split,
        } => {
            let options = commands::synth::SynthOptions {
                input,
                output,
                base_name,
                speed,
                language,
                reference_voice,
                backend,
                no_split,
            };
            commands::synth::run(options, config).context("synthesis failed")?;
        }
        Commands::Delete { path } => {
            commands::delete::run(&path, config).context("delete failed")?;
        }
        Commands::Name { base } => {
            commands::name::run(&base, &config).context("naming failed")?;
        }
        Commands::Info => {
            commands::info::run(&config);
        }
    }

    Ok(())
}
