//! # narrator-core
//!
//! Core types, traits, and error definitions for Narrator.
//!
//! This crate provides the foundational abstractions used across all other crates
//! in the workspace, including:
//!
//! - Request and result types (`SynthesisRequest`, `OutputFileHandle`, `WorkflowResult`)
//! - The synthesizer and file-removal seams (`SpeechSynthesizer`, `FileRemover`)
//! - The output naming policy (`OutputNaming`)
//! - Unified error handling via `NarratorError`
//! - Configuration structures

pub mod config;
pub mod error;
pub mod naming;
pub mod traits;
pub mod types;

pub use config::{
    DeviceConfig, LoggingConfig, NarratorConfig, ReplacePolicy, ServerConfig, SessionConfig,
    SynthesizerBackend, SynthesizerConfig, UiMode, WorkflowConfig,
};
pub use error::{NarratorError, NarratorResult};
pub use naming::{DEFAULT_BASE_NAME, OutputNaming, WAV_EXTENSION};
pub use traits::{FileRemover, FsRemover, SpeechSynthesizer};
pub use types::{
    Accelerator, DeleteOutcome, GenerateOutput, Lang, MAX_SPEED, MIN_SPEED, OutputFileHandle,
    SynthesisRequest, WorkflowResult, speed_in_range,
};
