//! Configuration structures for Narrator.
//!
//! Every section has serde defaults, so an empty TOML file is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NarratorError, NarratorResult};
use crate::naming::DEFAULT_BASE_NAME;
use crate::types::{Lang, MAX_SPEED, MIN_SPEED, speed_in_range};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarratorConfig {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NarratorConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> NarratorResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NarratorError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> NarratorResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the workflow cannot run with.
    pub fn validate(&self) -> NarratorResult<()> {
        let speed = self.workflow.speed;
        if !speed_in_range(speed) {
            return Err(NarratorError::config(format!(
                "workflow.speed must be between {MIN_SPEED} and {MAX_SPEED}, got {speed}"
            )));
        }
        if self.synthesizer.backend == SynthesizerBackend::Command {
            if self.synthesizer.program.trim().is_empty() {
                return Err(NarratorError::config(
                    "synthesizer.program is required for the command backend",
                ));
            }
            let missing = self.synthesizer.missing_placeholders();
            if let Some(required) = REQUIRED_PLACEHOLDERS
                .into_iter()
                .find(|name| missing.contains(name))
            {
                return Err(NarratorError::config(format!(
                    "synthesizer.args must contain {{{required}}}"
                )));
            }
        }
        if self.synthesizer.sample_rate == 0 {
            return Err(NarratorError::config("synthesizer.sample_rate must be non-zero"));
        }
        if self.session.ttl_secs == 0 || self.session.sweep_interval_secs == 0 {
            return Err(NarratorError::config(
                "session.ttl_secs and session.sweep_interval_secs must be non-zero",
            ));
        }
        Ok(())
    }
}

/// What happens to a held file when a new one replaces it in the same session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Drop the reference and leave the old file on disk.
    #[default]
    Keep,
    /// Delete the old file before holding the new one.
    DeletePrevious,
}

/// Generate/delete workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Directory that receives generated audio.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Prefix used when no base name is given.
    #[serde(default = "default_base_name")]
    pub default_base_name: String,
    /// Reference voice sample used for cloning.
    #[serde(default = "default_reference_voice")]
    pub reference_voice: PathBuf,
    /// Language passed to the model.
    #[serde(default)]
    pub language: Lang,
    /// Speaking-rate multiplier.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Let the model split input into sentences.
    #[serde(default = "default_split_sentences")]
    pub split_sentences: bool,
    /// Handling of a previously held file on regenerate.
    #[serde(default)]
    pub replace_policy: ReplacePolicy,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_base_name() -> String {
    DEFAULT_BASE_NAME.to_string()
}

fn default_reference_voice() -> PathBuf {
    PathBuf::from("reference_voices/reference.wav")
}

fn default_speed() -> f32 {
    1.2
}

fn default_split_sentences() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            default_base_name: default_base_name(),
            reference_voice: default_reference_voice(),
            language: Lang::default(),
            speed: default_speed(),
            split_sentences: default_split_sentences(),
            replace_policy: ReplacePolicy::default(),
        }
    }
}

/// Synthesizer implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerBackend {
    /// Run an external TTS command line.
    #[default]
    Command,
    /// Built-in tone generator (no model required).
    Tone,
}

impl std::str::FromStr for SynthesizerBackend {
    type Err = NarratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "command" | "cmd" => Ok(Self::Command),
            "tone" | "mock" => Ok(Self::Tone),
            _ => Err(NarratorError::config(format!("unknown synthesizer backend: {s}"))),
        }
    }
}

/// Placeholders a command template can use.
const TEMPLATE_PLACEHOLDERS: [&str; 7] = [
    "text",
    "out_path",
    "speaker_wav",
    "language",
    "speed",
    "split_sentences",
    "device",
];

/// Placeholders without which a command cannot produce the requested file.
const REQUIRED_PLACEHOLDERS: [&str; 2] = ["text", "out_path"];

/// Default XTTS-v2 invocation. Values arrive as argv, never spliced into code.
const XTTS_SCRIPT: &str = r#"import sys
import torch
from TTS.api import TTS

text, speaker_wav, language, out_path, speed, split, device = sys.argv[1:8]
if device == "auto":
    device = "cuda" if torch.cuda.is_available() else "cpu"
elif device == "metal":
    device = "mps"
tts = TTS("tts_models/multilingual/multi-dataset/xtts_v2").to(device)
tts.tts_to_file(
    text=text,
    speaker_wav=speaker_wav,
    language=language,
    file_path=out_path,
    split_sentences=split == "true",
    speed=float(speed),
)
"#;

/// Synthesizer settings.
///
/// `args` is a template; `{text}`, `{out_path}`, `{speaker_wav}`,
/// `{language}`, `{speed}`, `{split_sentences}` and `{device}` are
/// substituted per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    #[serde(default)]
    pub backend: SynthesizerBackend,
    /// Executable for the command backend.
    #[serde(default = "default_program")]
    pub program: String,
    /// Argument template for the command backend.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Sample rate of the tone backend in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl SynthesizerConfig {
    /// Placeholders that appear in no argument of the template.
    pub fn missing_placeholders(&self) -> Vec<&'static str> {
        TEMPLATE_PLACEHOLDERS
            .into_iter()
            .filter(|name| {
                let token = format!("{{{name}}}");
                !self.args.iter().any(|arg| arg.contains(&token))
            })
            .collect()
    }
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    [
        "-c",
        XTTS_SCRIPT,
        "{text}",
        "{speaker_wav}",
        "{language}",
        "{out_path}",
        "{speed}",
        "{split_sentences}",
        "{device}",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_sample_rate() -> u32 {
    24000
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            backend: SynthesizerBackend::default(),
            program: default_program(),
            args: default_args(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// Compute device preference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// One of `auto`, `cpu`, `cuda`, `metal`.
    #[serde(default = "default_device")]
    pub preference: String,
}

fn default_device() -> String {
    "auto".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            preference: default_device(),
        }
    }
}

/// Form shown by the UI shell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    /// One text box, one audio player, no deletion.
    Single,
    /// Text, base name, generate and delete buttons with per-session hand-off.
    #[default]
    Stateful,
}

impl UiMode {
    pub fn deletion_enabled(&self) -> bool {
        matches!(self, UiMode::Stateful)
    }
}

impl std::str::FromStr for UiMode {
    type Err = NarratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "stateful" => Ok(Self::Stateful),
            other => Err(NarratorError::config(format!("unknown ui mode: {other}"))),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address.
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Server port.
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Form variant.
    #[serde(default)]
    pub ui: UiMode,
    /// Page title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    7860
}

fn default_title() -> String {
    "Text-to-Speech Generator".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            ui: UiMode::default(),
            title: default_title(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// UI session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which a session is dropped.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// How often expired sessions are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Maximum number of live sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Delete a session's held file when the session expires or the server stops.
    #[serde(default)]
    pub cleanup_on_expiry: bool,
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_max_sessions() -> usize {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_sessions: default_max_sessions(),
            cleanup_on_expiry: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json or text).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
