//! Offline tone synthesizer.
//!
//! Writes one sine segment per sentence, sized by text length and speed.
//! It keeps the workflow usable without a model installed and gives tests a
//! deterministic, fast backend.

use std::path::Path;

use tracing::debug;

use narrator_core::{NarratorResult, SpeechSynthesizer, SynthesisRequest};

use crate::wav::{apply_fade_in, apply_fade_out, write_wav_samples};

const MS_PER_CHAR: f32 = 55.0;
const MIN_SEGMENT_MS: f32 = 150.0;
const SENTENCE_GAP_MS: f32 = 250.0;
const EDGE_FADE_MS: f32 = 10.0;
const AMPLITUDE: f32 = 0.3;
const BASE_FREQ_HZ: f32 = 180.0;

/// Tone generator standing in for a neural model.
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    sample_rate: u32,
}

impl ToneSynthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Render the request to mono samples.
    pub fn render(&self, request: &SynthesisRequest) -> Vec<f32> {
        let segments = split_segments(&request.text, request.split_sentences);
        let rate = self.sample_rate as f32;
        let gap = vec![0.0f32; (SENTENCE_GAP_MS / 1000.0 * rate) as usize];
        let mut samples = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                samples.extend_from_slice(&gap);
            }
            let chars = segment.chars().count() as f32;
            let duration_ms = (chars * MS_PER_CHAR).max(MIN_SEGMENT_MS) / request.speed;
            let len = (duration_ms / 1000.0 * rate) as usize;
            let freq = BASE_FREQ_HZ + 40.0 * (i % 5) as f32;

            let mut tone: Vec<f32> = (0..len)
                .map(|n| {
                    let t = n as f32 / rate;
                    AMPLITUDE * (2.0 * std::f32::consts::PI * freq * t).sin()
                })
                .collect();
            apply_fade_in(&mut tone, EDGE_FADE_MS, self.sample_rate);
            apply_fade_out(&mut tone, EDGE_FADE_MS, self.sample_rate);
            samples.extend(tone);
        }

        samples
    }
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self::new(24000)
    }
}

impl SpeechSynthesizer for ToneSynthesizer {
    fn synthesize(&self, request: &SynthesisRequest, destination: &Path) -> NarratorResult<()> {
        request.validate()?;
        let samples = self.render(request);
        debug!(
            samples = samples.len(),
            sample_rate = self.sample_rate,
            dest = %destination.display(),
            "Writing tone audio"
        );
        write_wav_samples(destination, &samples, self.sample_rate)
    }

    fn name(&self) -> &str {
        "tone"
    }
}

/// Split text into sentences on terminal punctuation.
fn split_segments(text: &str, split_sentences: bool) -> Vec<&str> {
    if !split_sentences {
        return vec![text.trim()];
    }
    let segments: Vec<&str> = text
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .collect();
    if segments.is_empty() {
        vec![text.trim()]
    } else {
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::probe_wav;

    #[test]
    fn test_split_segments() {
        assert_eq!(
            split_segments("Hello there. How are you? Fine!", true),
            vec!["Hello there.", "How are you?", "Fine!"]
        );
        assert_eq!(split_segments("One. Two.", false), vec!["One. Two."]);
        assert_eq!(split_segments("...", true), vec!["..."]);
    }

    #[test]
    fn test_speed_shortens_audio() {
        let synth = ToneSynthesizer::new(16000);
        let slow = SynthesisRequest::new("Hello world", "ref.wav").with_speed(1.0);
        let fast = slow.clone().with_speed(2.0);
        assert!(synth.render(&fast).len() < synth.render(&slow).len());
    }

    #[test]
    fn test_writes_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.wav");
        let synth = ToneSynthesizer::default();

        let request = SynthesisRequest::new("Hello world. Second sentence.", "ref.wav");
        synth.synthesize(&request, &dest).unwrap();

        let info = probe_wav(&dest).unwrap();
        assert_eq!(info.sample_rate, 24000);
        assert!(info.num_frames > 0);
        assert!(std::fs::metadata(&dest).unwrap().len() > 44);
    }

    #[test]
    fn test_rejects_blank_text() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.wav");
        let request = SynthesisRequest::new("  ", "ref.wav");
        assert!(ToneSynthesizer::default().synthesize(&request, &dest).is_err());
        assert!(!dest.exists());
    }
}
