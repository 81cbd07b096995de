//! Output file naming.
//!
//! Every generated file is named `<base>_<uuid>.wav` inside a single output
//! directory, so repeated or concurrent requests with the same base name
//! never collide.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::NarratorResult;
use crate::types::OutputFileHandle;

/// Prefix used when the caller gives no base name.
pub const DEFAULT_BASE_NAME: &str = "generated_audio";

/// Extension for uncompressed waveform audio.
pub const WAV_EXTENSION: &str = "wav";

/// Derives unique output paths under a fixed directory.
#[derive(Debug, Clone)]
pub struct OutputNaming {
    output_dir: PathBuf,
    default_base: String,
}

impl OutputNaming {
    /// Create the policy, creating `output_dir` if it does not exist yet.
    pub fn new(output_dir: impl Into<PathBuf>) -> NarratorResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            default_base: DEFAULT_BASE_NAME.to_string(),
        })
    }

    /// Use a different prefix for blank base names.
    pub fn with_default_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        if !base.trim().is_empty() {
            self.default_base = base.trim().to_string();
        }
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn default_base(&self) -> &str {
        &self.default_base
    }

    /// Build a fresh, collision-free path for `base_name`.
    ///
    /// Blank input falls back to the default prefix; anything else is trimmed.
    pub fn name_file(&self, base_name: &str) -> PathBuf {
        let trimmed = base_name.trim();
        let base = if trimmed.is_empty() {
            self.default_base.as_str()
        } else {
            trimmed
        };
        let id = Uuid::new_v4().hyphenated();
        self.output_dir.join(format!("{base}_{id}.{WAV_EXTENSION}"))
    }

    /// Same as [`name_file`](Self::name_file), wrapped in a handle.
    pub fn handle_for(&self, base_name: &str) -> OutputFileHandle {
        OutputFileHandle::new(self.name_file(base_name))
    }

    /// Whether `file_name` is a bare name that resolves inside the output directory.
    pub fn resolve_file_name(&self, file_name: &str) -> Option<PathBuf> {
        let plain = !file_name.is_empty()
            && !file_name.contains(['/', '\\'])
            && file_name != "."
            && file_name != ".."
            && file_name.ends_with(&format!(".{WAV_EXTENSION}"));
        plain.then(|| self.output_dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid_suffix<'a>(name: &'a str, prefix: &str) -> &'a str {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(".wav"))
            .unwrap()
    }

    #[test]
    fn test_named_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        let naming = OutputNaming::new(dir.path()).unwrap();

        let path = naming.name_file("  demo ");
        assert_eq!(path.parent().unwrap(), dir.path());

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("demo_"));
        assert!(name.ends_with(".wav"));
        assert!(Uuid::parse_str(uuid_suffix(name, "demo_")).is_ok());
    }

    #[test]
    fn test_blank_base_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let naming = OutputNaming::new(dir.path()).unwrap();

        for blank in ["", "   ", "\t\n"] {
            let path = naming.name_file(blank);
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("generated_audio_"), "{name}");
        }
    }

    #[test]
    fn test_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let naming = OutputNaming::new(dir.path()).unwrap();

        let a = naming.name_file("same");
        let b = naming.name_file("same");
        assert_ne!(a, b);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("output");
        let naming = OutputNaming::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(naming.output_dir(), nested.as_path());
    }

    #[test]
    fn test_custom_default_base() {
        let dir = tempfile::tempdir().unwrap();
        let naming = OutputNaming::new(dir.path())
            .unwrap()
            .with_default_base("speech");
        assert_eq!(naming.default_base(), "speech");

        let unchanged = OutputNaming::new(dir.path())
            .unwrap()
            .with_default_base("  ");
        assert_eq!(unchanged.default_base(), DEFAULT_BASE_NAME);
    }

    #[test]
    fn test_resolve_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let naming = OutputNaming::new(dir.path()).unwrap();

        assert_eq!(
            naming.resolve_file_name("demo_1.wav"),
            Some(dir.path().join("demo_1.wav"))
        );
        assert!(naming.resolve_file_name("../secret.wav").is_none());
        assert!(naming.resolve_file_name("a/b.wav").is_none());
        assert!(naming.resolve_file_name("notes.txt").is_none());
        assert!(naming.resolve_file_name("").is_none());
    }
}
