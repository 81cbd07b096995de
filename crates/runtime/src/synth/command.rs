//! External command synthesizer.
//!
//! Runs a TTS command line (by default the Coqui `tts` CLI with XTTS-v2) once
//! per request. The argument list is a template; placeholders are substituted
//! in a single pass so user text can never inject another placeholder.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use narrator_core::{
    Accelerator, NarratorError, NarratorResult, SpeechSynthesizer, SynthesisRequest,
};

/// Longest stderr excerpt carried into an error message.
const STDERR_TAIL_CHARS: usize = 600;

/// Synthesizer backed by an external program.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    accelerator: Accelerator,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, accelerator: Accelerator) -> Self {
        Self {
            program: program.into(),
            args,
            accelerator,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Substitute request values into the argument template.
    pub fn render_args(&self, request: &SynthesisRequest, destination: &Path) -> Vec<String> {
        let device = self.accelerator.to_string();
        let speaker_wav = request.reference_voice.to_string_lossy();
        let out_path = destination.to_string_lossy();
        let speed = request.speed.to_string();
        let split = request.split_sentences.to_string();

        let lookup = |name: &str| -> Option<&str> {
            match name {
                "text" => Some(request.text.as_str()),
                "out_path" => Some(&out_path),
                "speaker_wav" => Some(&speaker_wav),
                "language" => Some(request.lang.code()),
                "speed" => Some(&speed),
                "split_sentences" => Some(&split),
                "device" => Some(&device),
                _ => None,
            }
        };

        self.args
            .iter()
            .map(|arg| render_template(arg, &lookup))
            .collect()
    }
}

/// Replace `{name}` tokens known to `lookup`; unknown tokens are left verbatim.
fn render_template<'a>(template: &str, lookup: &impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        text.to_string()
    } else {
        text.chars().skip(count - STDERR_TAIL_CHARS).collect()
    }
}

fn discard_partial(destination: &Path) {
    if destination.exists() {
        if let Err(e) = std::fs::remove_file(destination) {
            warn!(dest = %destination.display(), "Could not remove partial output: {e}");
        }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    #[instrument(
        skip(self, request),
        fields(program = %self.program, text_len = request.text.len())
    )]
    fn synthesize(&self, request: &SynthesisRequest, destination: &Path) -> NarratorResult<()> {
        request.validate()?;

        if !request.reference_voice.is_file() {
            return Err(NarratorError::synthesis(format!(
                "reference voice not found: {}",
                request.reference_voice.display()
            )));
        }

        let args = self.render_args(request, destination);
        debug!(args = ?args, "Launching synthesizer");

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                NarratorError::synthesis(format!("failed to launch {}: {e}", self.program))
            })?;

        if !output.status.success() {
            discard_partial(destination);
            return Err(NarratorError::synthesis(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        if !destination.is_file() {
            return Err(NarratorError::synthesis(format!(
                "{} finished but wrote no audio to {}",
                self.program,
                destination.display()
            )));
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            dest = %destination.display(),
            "Synthesizer command finished"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "command"
    }
}
