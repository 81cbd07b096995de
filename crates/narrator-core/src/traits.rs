//! Trait definitions for the workflow's external collaborators.

use std::io;
use std::path::Path;

use crate::error::NarratorResult;
use crate::types::SynthesisRequest;

/// Boundary call into a voice-cloning text-to-speech model.
///
/// Implementations write a playable WAV file at `destination`. Completion
/// means the file is there; any failure is returned as an error and the
/// caller treats the request as failed.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `request` into a WAV file at `destination`.
    fn synthesize(&self, request: &SynthesisRequest, destination: &Path) -> NarratorResult<()>;

    /// Short backend name for logs and `/info`.
    fn name(&self) -> &str;
}

/// Removes generated files from disk.
pub trait FileRemover: Send + Sync {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Plain `std::fs` removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl FileRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_remover_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        FsRemover.remove(&path).unwrap();
        assert!(!path.exists());

        let err = FsRemover.remove(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
