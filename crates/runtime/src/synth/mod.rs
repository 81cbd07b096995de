//! Synthesizer backends.

mod command;
mod tone;

use std::sync::Arc;

use tracing::{info, warn};

use narrator_core::{Accelerator, SpeechSynthesizer, SynthesizerBackend, SynthesizerConfig};

pub use command::CommandSynthesizer;
pub use tone::ToneSynthesizer;

/// Build the configured synthesizer once, for injection into the workflow.
pub fn build_synthesizer(
    config: &SynthesizerConfig,
    accelerator: Accelerator,
) -> Arc<dyn SpeechSynthesizer> {
    match config.backend {
        SynthesizerBackend::Command => {
            info!(program = %config.program, device = %accelerator, "Using command synthesizer");
            let missing = config.missing_placeholders();
            if !missing.is_empty() {
                warn!(
                    ?missing,
                    "Command template ignores these settings; the model uses its defaults"
                );
            }
            Arc::new(CommandSynthesizer::new(
                config.program.clone(),
                config.args.clone(),
                accelerator,
            ))
        }
        SynthesizerBackend::Tone => {
            info!(sample_rate = config.sample_rate, "Using tone synthesizer");
            Arc::new(ToneSynthesizer::new(config.sample_rate))
        }
    }
}
