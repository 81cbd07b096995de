//! # narrator-runtime
//!
//! Runtime pieces for Narrator.
//!
//! This crate provides:
//! - Synthesizer backends (external command, offline tone)
//! - The generate/delete workflow
//! - Per-session hand-off state with expiry
//! - Structured logging and metrics
//! - Accelerator probing

pub mod device;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod synth;
pub mod wav;
pub mod workflow;

use std::sync::Arc;

use tracing::info;

use narrator_core::{NarratorConfig, NarratorResult};

pub use device::{DevicePreference, select_accelerator};
pub use session::{AudioSession, HandoffSlot, SessionStore};
pub use synth::{CommandSynthesizer, ToneSynthesizer, build_synthesizer};
pub use workflow::AudioWorkflow;

/// Build the workflow described by `config`.
///
/// Probes the device, constructs the synthesizer once and injects it.
pub fn workflow_from_config(config: &NarratorConfig) -> NarratorResult<AudioWorkflow> {
    let preference = DevicePreference::from_name(&config.device.preference);
    let accelerator = select_accelerator(preference)?;
    let synthesizer = build_synthesizer(&config.synthesizer, accelerator);
    info!(device = %accelerator, backend = synthesizer.name(), "Synthesizer initialised");
    AudioWorkflow::new(config.workflow.clone(), synthesizer)
}

/// Shared workflow plus its sessions.
pub fn runtime_from_config(
    config: &NarratorConfig,
) -> NarratorResult<(Arc<AudioWorkflow>, Arc<SessionStore>)> {
    let workflow = Arc::new(workflow_from_config(config)?);
    let sessions = Arc::new(SessionStore::new(config.session.clone()));
    Ok((workflow, sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_core::SynthesizerBackend;

    #[test]
    fn test_workflow_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NarratorConfig::default();
        config.workflow.output_dir = dir.path().join("out");
        config.synthesizer.backend = SynthesizerBackend::Tone;
        config.device.preference = "cpu".into();

        let workflow = workflow_from_config(&config).unwrap();
        assert_eq!(workflow.synthesizer_name(), "tone");
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn test_runtime_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NarratorConfig::default();
        config.workflow.output_dir = dir.path().to_path_buf();
        config.synthesizer.backend = SynthesizerBackend::Tone;

        let (_workflow, sessions) = runtime_from_config(&config).unwrap();
        assert!(sessions.is_empty());
    }
}
