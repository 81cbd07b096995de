//! Synthesis command implementation.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use narrator_core::{Lang, NarratorConfig, SynthesizerBackend};
use narrator_runtime::wav::probe_wav;
use narrator_runtime::workflow_from_config;

/// Options for the synth command; `None` keeps the configured value.
#[derive(Debug, Default)]
pub struct SynthOptions {
    /// Text, or `@path` to read it from a file.
    pub input: String,
    /// Explicit output path; the naming policy is used when absent.
    pub output: Option<PathBuf>,
    pub base_name: String,
    pub speed: Option<f32>,
    pub language: Option<String>,
    pub reference_voice: Option<PathBuf>,
    pub backend: Option<SynthesizerBackend>,
    pub no_split: bool,
}

impl SynthOptions {
    fn apply(&self, config: &mut NarratorConfig) -> Result<()> {
        if let Some(speed) = self.speed {
            config.workflow.speed = speed;
        }
        if let Some(language) = &self.language {
            config.workflow.language = language.parse::<Lang>()?;
        }
        if let Some(voice) = &self.reference_voice {
            config.workflow.reference_voice = voice.clone();
        }
        if let Some(backend) = self.backend {
            config.synthesizer.backend = backend;
        }
        if self.no_split {
            config.workflow.split_sentences = false;
        }
        config.validate()?;
        Ok(())
    }

    fn read_text(&self) -> Result<String> {
        let text = if let Some(path) = self.input.strip_prefix('@') {
            info!(path = path, "Reading text from file");
            std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?
        } else {
            self.input.clone()
        };

        if text.trim().is_empty() {
            bail!("input text is empty");
        }
        Ok(text)
    }
}

/// Run the synthesis command and return the written file.
pub fn run(options: SynthOptions, mut config: NarratorConfig) -> Result<PathBuf> {
    let start = Instant::now();

    options.apply(&mut config)?;
    let text = options.read_text()?;
    let workflow = workflow_from_config(&config)?;

    info!(
        text_len = text.len(),
        lang = %config.workflow.language,
        backend = workflow.synthesizer_name(),
        "Starting synthesis"
    );

    let synth_start = Instant::now();
    let handle = match &options.output {
        Some(path) => workflow.generate_to(&text, path)?,
        None => workflow.generate_handle(&text, &options.base_name)?,
    };
    let synth_duration = synth_start.elapsed();

    let total_duration = start.elapsed();

    println!("Synthesis complete!");
    println!();
    println!("Input:     {} chars", text.len());
    println!("Language:  {}", config.workflow.language);
    println!("Speed:     {:.2}x", config.workflow.speed);
    println!("Backend:   {}", workflow.synthesizer_name());
    println!("Output:    {}", handle.display_path());

    match probe_wav(handle.path()) {
        Ok(wav) => {
            let audio_sec = wav.duration_ms() / 1000.0;
            let rtf = if audio_sec > 0.0 {
                synth_duration.as_secs_f32() / audio_sec
            } else {
                0.0
            };
            println!();
            println!("Audio:");
            println!("  Duration:    {audio_sec:.2} sec");
            println!("  Sample rate: {} Hz", wav.sample_rate);
            println!("  Channels:    {}", wav.channels);
            println!();
            println!("Performance:");
            println!("  Synthesis:   {} ms", synth_duration.as_millis());
            println!("  Total:       {} ms", total_duration.as_millis());
            println!("  RTF:         {rtf:.3}x");
        }
        Err(e) => debug!("Output is not a readable WAV: {e}"),
    }

    info!(output = %handle.path().display(), "Synthesis saved to file");
    Ok(handle.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tone_config(dir: &std::path::Path) -> NarratorConfig {
        let mut config = NarratorConfig::default();
        config.workflow.output_dir = dir.join("output");
        config.synthesizer.backend = SynthesizerBackend::Tone;
        config.device.preference = "cpu".into();
        config
    }

    #[test]
    fn test_synth_uses_naming_policy() {
        let dir = tempdir().unwrap();
        let options = SynthOptions {
            input: "Hello world".to_string(),
            base_name: "intro".to_string(),
            ..SynthOptions::default()
        };

        let path = run(options, tone_config(dir.path())).unwrap();
        assert!(path.is_file());
        assert_eq!(path.parent().unwrap(), dir.path().join("output"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("intro_") && name.ends_with(".wav"));
    }

    #[test]
    fn test_synth_explicit_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("test.wav");
        let options = SynthOptions {
            input: "Hello world".to_string(),
            output: Some(output.clone()),
            speed: Some(1.0),
            language: Some("de".to_string()),
            no_split: true,
            ..SynthOptions::default()
        };

        let path = run(options, tone_config(dir.path())).unwrap();
        assert_eq!(path, output);
        assert!(output.exists());
    }

    #[test]
    fn test_synth_reads_file_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("script.txt");
        std::fs::write(&input, "Read from a file.").unwrap();
        let options = SynthOptions {
            input: format!("@{}", input.display()),
            ..SynthOptions::default()
        };

        assert!(run(options, tone_config(dir.path())).unwrap().is_file());
    }

    #[test]
    fn test_synth_empty_error() {
        let dir = tempdir().unwrap();
        let options = SynthOptions {
            input: "  ".to_string(),
            ..SynthOptions::default()
        };

        assert!(run(options, tone_config(dir.path())).is_err());
    }

    #[test]
    fn test_synth_invalid_lang() {
        let dir = tempdir().unwrap();
        let options = SynthOptions {
            input: "Test".to_string(),
            language: Some("klingon".to_string()),
            ..SynthOptions::default()
        };

        assert!(run(options, tone_config(dir.path())).is_err());
    }

    #[test]
    fn test_synth_invalid_speed() {
        let dir = tempdir().unwrap();
        let options = SynthOptions {
            input: "Test".to_string(),
            speed: Some(0.0),
            ..SynthOptions::default()
        };

        assert!(run(options, tone_config(dir.path())).is_err());
    }
}
