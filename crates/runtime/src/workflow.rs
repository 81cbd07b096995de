//! Generate and delete workflows.
//!
//! `generate` names a file, asks the synthesizer for audio and hands the path
//! back twice (playback and hand-off). `delete` removes a handed-off file and
//! always answers with a status line instead of an error.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use narrator_core::{
    DeleteOutcome, FileRemover, FsRemover, GenerateOutput, MAX_SPEED, MIN_SPEED, NarratorError,
    NarratorResult, OutputFileHandle, OutputNaming, SpeechSynthesizer, SynthesisRequest,
    WorkflowConfig, WorkflowResult, speed_in_range,
};

use crate::metrics::WorkflowMetrics;
use crate::wav::probe_wav;

/// The generate/delete workflow with its collaborators injected.
pub struct AudioWorkflow {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    remover: Arc<dyn FileRemover>,
    naming: OutputNaming,
    config: WorkflowConfig,
    metrics: WorkflowMetrics,
}

impl std::fmt::Debug for AudioWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioWorkflow")
            .field("synthesizer", &self.synthesizer.name())
            .field("output_dir", &self.naming.output_dir())
            .field("config", &self.config)
            .finish()
    }
}

impl AudioWorkflow {
    /// Create the workflow; the output directory is created here if missing.
    pub fn new(
        config: WorkflowConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> NarratorResult<Self> {
        if !speed_in_range(config.speed) {
            return Err(NarratorError::config(format!(
                "speed must be between {MIN_SPEED} and {MAX_SPEED}, got {}",
                config.speed
            )));
        }
        let naming = OutputNaming::new(&config.output_dir)?
            .with_default_base(config.default_base_name.clone());

        info!(
            output_dir = %config.output_dir.display(),
            synthesizer = synthesizer.name(),
            lang = %config.language,
            speed = config.speed,
            "Audio workflow ready"
        );

        Ok(Self {
            synthesizer,
            remover: Arc::new(FsRemover),
            naming,
            config,
            metrics: WorkflowMetrics,
        })
    }

    /// Replace the file remover.
    pub fn with_remover(mut self, remover: Arc<dyn FileRemover>) -> Self {
        self.remover = remover;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn naming(&self) -> &OutputNaming {
        &self.naming
    }

    pub fn synthesizer_name(&self) -> &str {
        self.synthesizer.name()
    }

    /// Request with the configured voice, language, speed and splitting.
    pub fn build_request(&self, text: &str) -> SynthesisRequest {
        SynthesisRequest::new(text, self.config.reference_voice.clone())
            .with_lang(self.config.language)
            .with_speed(self.config.speed)
            .with_split_sentences(self.config.split_sentences)
    }

    /// Generate audio and return the path for both playback and hand-off.
    pub fn generate(&self, text: &str, base_name: &str) -> NarratorResult<GenerateOutput> {
        self.generate_handle(text, base_name)
            .map(|handle| GenerateOutput::from_handle(&handle))
    }

    /// Generate audio and return a handle to the new file.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn generate_handle(&self, text: &str, base_name: &str) -> NarratorResult<OutputFileHandle> {
        let request = self.checked_request(text)?;
        let handle = self.naming.handle_for(base_name);
        self.synthesize_into(&request, handle)
    }

    /// Generate audio into an explicit destination, bypassing the naming policy.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn generate_to(&self, text: &str, destination: &Path) -> NarratorResult<OutputFileHandle> {
        let request = self.checked_request(text)?;
        let handle = OutputFileHandle::new(destination);
        if let Some(parent) = handle.path().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.synthesize_into(&request, handle)
    }

    fn checked_request(&self, text: &str) -> NarratorResult<SynthesisRequest> {
        self.metrics.generate_received();
        let request = self.build_request(text);
        if let Err(e) = request.validate() {
            self.metrics.generate_failed();
            return Err(e);
        }
        Ok(request)
    }

    fn synthesize_into(
        &self,
        request: &SynthesisRequest,
        handle: OutputFileHandle,
    ) -> NarratorResult<OutputFileHandle> {
        let start = Instant::now();
        let result = self.synthesizer.synthesize(request, handle.path());
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_synthesis_ms(elapsed_ms);

        if let Err(e) = result {
            self.metrics.generate_failed();
            warn!(path = %handle.path().display(), "Synthesis failed: {e}");
            return Err(e);
        }

        if !handle.exists() {
            self.metrics.generate_failed();
            return Err(NarratorError::synthesis(format!(
                "synthesizer reported success but {} does not exist",
                handle.path().display()
            )));
        }

        match probe_wav(handle.path()) {
            Ok(wav) => debug!(
                duration_ms = wav.duration_ms(),
                sample_rate = wav.sample_rate,
                "Generated audio"
            ),
            Err(e) => debug!("Generated file is not a readable WAV header: {e}"),
        }

        info!(
            path = %handle.path().display(),
            elapsed_ms = elapsed_ms as u64,
            "Audio generated"
        );
        Ok(handle)
    }

    /// Delete a handed-off file; the result always carries a status line.
    pub fn delete(&self, handoff_path: &str) -> WorkflowResult {
        self.delete_outcome(handoff_path).into_result(handoff_path)
    }

    /// Delete a handed-off file and report what happened.
    #[instrument(skip(self))]
    pub fn delete_outcome(&self, handoff_path: &str) -> DeleteOutcome {
        let outcome = if handoff_path.is_empty() || !Path::new(handoff_path).exists() {
            DeleteOutcome::NotFound
        } else {
            match self.remover.remove(Path::new(handoff_path)) {
                Ok(()) => DeleteOutcome::Deleted,
                Err(e) => classify_removal_error(&e),
            }
        };

        match &outcome {
            DeleteOutcome::Deleted => info!(path = handoff_path, "Audio deleted"),
            DeleteOutcome::NotFound => debug!(path = handoff_path, "Nothing to delete"),
            DeleteOutcome::PermissionDenied(details) | DeleteOutcome::Failed(details) => {
                warn!(path = handoff_path, details = %details, "Audio could not be deleted")
            }
        }
        self.metrics.delete_finished(&outcome);
        outcome
    }
}

fn classify_removal_error(err: &io::Error) -> DeleteOutcome {
    match err.kind() {
        io::ErrorKind::PermissionDenied => DeleteOutcome::PermissionDenied(err.to_string()),
        // Removed concurrently between the existence check and removal.
        io::ErrorKind::NotFound => DeleteOutcome::NotFound,
        _ => DeleteOutcome::Failed(err.to_string()),
    }
}
