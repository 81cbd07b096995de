//! WAV file I/O utilities.

use std::io;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use narrator_core::{NarratorError, NarratorResult};

/// Header facts about a WAV file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per channel.
    pub num_frames: u32,
}

impl WavInfo {
    pub fn duration_ms(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames as f32 * 1000.0 / self.sample_rate as f32
    }
}

fn hound_err(e: hound::Error) -> NarratorError {
    match e {
        hound::Error::IoError(io) => NarratorError::Io(io),
        other => NarratorError::Io(io::Error::other(other.to_string())),
    }
}

/// Write mono f32 samples to a 16-bit PCM WAV file.
pub fn write_wav_samples(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate: u32,
) -> NarratorResult<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec).map_err(hound_err)?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(sample_i16).map_err(hound_err)?;
    }

    writer.finalize().map_err(hound_err)?;

    Ok(())
}

/// Read the header of a WAV file without decoding samples.
pub fn probe_wav(path: impl AsRef<Path>) -> NarratorResult<WavInfo> {
    let reader = WavReader::open(path.as_ref()).map_err(hound_err)?;
    let spec = reader.spec();
    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        num_frames: reader.duration(),
    })
}

/// Apply a Hann fade-in over the first `fade_ms` milliseconds.
pub fn apply_fade_in(samples: &mut [f32], fade_ms: f32, sample_rate: u32) {
    let fade_samples = ((fade_ms / 1000.0) * sample_rate as f32) as usize;
    let fade_samples = fade_samples.min(samples.len());

    for (i, sample) in samples.iter_mut().take(fade_samples).enumerate() {
        let t = i as f32 / fade_samples.max(1) as f32;
        let gain = 0.5 * (1.0 - (std::f32::consts::PI * t).cos());
        *sample *= gain;
    }
}

/// Apply a Hann fade-out over the last `fade_ms` milliseconds.
pub fn apply_fade_out(samples: &mut [f32], fade_ms: f32, sample_rate: u32) {
    let fade_samples = ((fade_ms / 1000.0) * sample_rate as f32) as usize;
    let fade_samples = fade_samples.min(samples.len());
    let start = samples.len() - fade_samples;

    for (i, sample) in samples[start..].iter_mut().enumerate() {
        let t = i as f32 / fade_samples.max(1) as f32;
        let gain = 0.5 * (1.0 + (std::f32::consts::PI * t).cos());
        *sample *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples = vec![0.25f32; 24000];
        write_wav_samples(&path, &samples, 24000).unwrap();

        let info = probe_wav(&path).unwrap();
        assert_eq!(info.sample_rate, 24000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.num_frames, 24000);
        assert!((info.duration_ms() - 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_probe_rejects_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.wav");
        std::fs::write(&path, b"not audio").unwrap();
        assert!(probe_wav(&path).is_err());
    }

    #[test]
    fn test_fades() {
        let mut samples = vec![1.0f32; 1000];
        apply_fade_in(&mut samples, 10.0, 10_000);
        assert_eq!(samples[0], 0.0);
        assert!((samples[999] - 1.0).abs() < f32::EPSILON);

        let mut samples = vec![1.0f32; 1000];
        apply_fade_out(&mut samples, 10.0, 10_000);
        assert!((samples[0] - 1.0).abs() < f32::EPSILON);
        assert!(samples[999] < 0.01);
    }

    #[test]
    fn test_fade_longer_than_buffer() {
        let mut samples = vec![1.0f32; 10];
        apply_fade_in(&mut samples, 1000.0, 24000);
        apply_fade_out(&mut samples, 1000.0, 24000);
        assert!(samples.iter().all(|s| s.is_finite()));
    }
}
