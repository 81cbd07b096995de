//! Core data types for the generate/delete workflow.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NarratorError, NarratorResult};

/// Languages accepted by the multilingual voice-cloning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lang {
    /// English.
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "de")]
    De,
    #[serde(rename = "it")]
    It,
    #[serde(rename = "pt")]
    Pt,
    #[serde(rename = "pl")]
    Pl,
    #[serde(rename = "tr")]
    Tr,
    #[serde(rename = "ru")]
    Ru,
    #[serde(rename = "nl")]
    Nl,
    #[serde(rename = "cs")]
    Cs,
    #[serde(rename = "ar")]
    Ar,
    /// Simplified Chinese.
    #[serde(rename = "zh-cn")]
    ZhCn,
    #[serde(rename = "ja")]
    Ja,
    #[serde(rename = "hu")]
    Hu,
    #[serde(rename = "ko")]
    Ko,
    #[serde(rename = "hi")]
    Hi,
}

impl Lang {
    /// Every supported language, in display order.
    pub const ALL: [Lang; 17] = [
        Lang::En,
        Lang::Es,
        Lang::Fr,
        Lang::De,
        Lang::It,
        Lang::Pt,
        Lang::Pl,
        Lang::Tr,
        Lang::Ru,
        Lang::Nl,
        Lang::Cs,
        Lang::Ar,
        Lang::ZhCn,
        Lang::Ja,
        Lang::Hu,
        Lang::Ko,
        Lang::Hi,
    ];

    /// The language code passed to the model.
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Es => "es",
            Lang::Fr => "fr",
            Lang::De => "de",
            Lang::It => "it",
            Lang::Pt => "pt",
            Lang::Pl => "pl",
            Lang::Tr => "tr",
            Lang::Ru => "ru",
            Lang::Nl => "nl",
            Lang::Cs => "cs",
            Lang::Ar => "ar",
            Lang::ZhCn => "zh-cn",
            Lang::Ja => "ja",
            Lang::Hu => "hu",
            Lang::Ko => "ko",
            Lang::Hi => "hi",
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = NarratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Lang::ALL
            .into_iter()
            .find(|lang| lang.code() == wanted)
            .ok_or_else(|| NarratorError::invalid_input(format!("unsupported language: {s}")))
    }
}

/// Compute device the synthesizer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    #[default]
    Cpu,
    Cuda,
    Metal,
    /// No probe was compiled in; the model process picks its own device.
    Auto,
}

impl std::fmt::Display for Accelerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accelerator::Cpu => write!(f, "cpu"),
            Accelerator::Cuda => write!(f, "cuda"),
            Accelerator::Metal => write!(f, "metal"),
            Accelerator::Auto => write!(f, "auto"),
        }
    }
}

/// A single synthesis request handed to the synthesizer.
///
/// Built once per generate call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak.
    pub text: String,
    /// Reference voice sample used for cloning.
    pub reference_voice: PathBuf,
    /// Target language.
    pub lang: Lang,
    /// Let the model split long input into sentences.
    pub split_sentences: bool,
    /// Speaking-rate multiplier.
    pub speed: f32,
}

impl SynthesisRequest {
    /// Create a new synthesis request with default settings.
    pub fn new(text: impl Into<String>, reference_voice: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            reference_voice: reference_voice.into(),
            lang: Lang::default(),
            split_sentences: true,
            speed: 1.0,
        }
    }

    /// Set the language.
    pub fn with_lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Set the speaking-rate multiplier.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Enable or disable sentence splitting.
    pub fn with_split_sentences(mut self, split: bool) -> Self {
        self.split_sentences = split;
        self
    }

    /// Check the request before it reaches the synthesizer.
    pub fn validate(&self) -> NarratorResult<()> {
        if self.text.trim().is_empty() {
            return Err(NarratorError::invalid_input("text cannot be empty"));
        }
        if !speed_in_range(self.speed) {
            return Err(NarratorError::invalid_input(format!(
                "speed must be between {MIN_SPEED} and {MAX_SPEED}, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

/// Slowest accepted speaking rate.
pub const MIN_SPEED: f32 = 0.1;
/// Fastest accepted speaking rate.
pub const MAX_SPEED: f32 = 10.0;

/// Whether `speed` is a usable speaking-rate multiplier.
pub fn speed_in_range(speed: f32) -> bool {
    speed.is_finite() && (MIN_SPEED..=MAX_SPEED).contains(&speed)
}

/// A generated audio file on disk.
///
/// Existence is checked lazily; the file may disappear underneath the handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputFileHandle {
    path: PathBuf,
}

impl OutputFileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is currently present on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Bare file name, e.g. `demo_<uuid>.wav`.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Path rendered the way the UI shows it.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Result of a successful generate call.
///
/// The same path feeds both the playback surface and the hand-off slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOutput {
    pub audio_path: String,
    pub handoff_path: String,
}

impl GenerateOutput {
    pub fn from_handle(handle: &OutputFileHandle) -> Self {
        let path = handle.display_path();
        Self {
            audio_path: path.clone(),
            handoff_path: path,
        }
    }
}

/// What the UI shows after a workflow step.
///
/// An empty `audio_path` means "no audio".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub audio_path: String,
    pub status_message: String,
}

impl WorkflowResult {
    pub fn new(audio_path: impl Into<String>, status_message: impl Into<String>) -> Self {
        Self {
            audio_path: audio_path.into(),
            status_message: status_message.into(),
        }
    }

    /// Whether the playback surface was cleared.
    pub fn is_cleared(&self) -> bool {
        self.audio_path.is_empty()
    }
}

/// Outcome of a delete attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file was removed.
    Deleted,
    /// Nothing to delete: empty path or the file is already gone.
    NotFound,
    /// Removal was refused by the operating system.
    PermissionDenied(String),
    /// Any other removal failure.
    Failed(String),
}

impl DeleteOutcome {
    /// Status line shown to the user.
    pub fn status_message(&self) -> String {
        match self {
            DeleteOutcome::Deleted => "File deleted successfully.".to_string(),
            DeleteOutcome::NotFound => "File not found or already deleted.".to_string(),
            DeleteOutcome::PermissionDenied(details) => {
                format!("Permission error: {details}. Please ensure the file is not in use.")
            }
            DeleteOutcome::Failed(details) => format!("Error deleting file: {details}"),
        }
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted => "deleted",
            DeleteOutcome::NotFound => "not_found",
            DeleteOutcome::PermissionDenied(_) => "permission_denied",
            DeleteOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted)
    }

    /// Convert into the UI result; only a successful delete clears playback.
    pub fn into_result(self, handoff_path: &str) -> WorkflowResult {
        let audio_path = if self.is_deleted() {
            String::new()
        } else {
            handoff_path.to_string()
        };
        WorkflowResult::new(audio_path, self.status_message())
    }
}
