//! Delete command implementation.

use anyhow::{Result, bail};

use narrator_core::{DeleteOutcome, NarratorConfig, SynthesizerBackend};
use narrator_runtime::workflow_from_config;

/// Delete a generated file and print the status line.
///
/// Missing files are not an error; permission and other I/O failures are.
pub fn run(path: &str, mut config: NarratorConfig) -> Result<DeleteOutcome> {
    // Deleting never synthesizes, so skip the external command entirely.
    config.synthesizer.backend = SynthesizerBackend::Tone;
    let workflow = workflow_from_config(&config)?;

    let outcome = workflow.delete_outcome(path);
    println!("{}", outcome.status_message());

    match &outcome {
        DeleteOutcome::Deleted | DeleteOutcome::NotFound => Ok(outcome),
        DeleteOutcome::PermissionDenied(_) | DeleteOutcome::Failed(_) => {
            bail!("could not delete {path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> NarratorConfig {
        let mut config = NarratorConfig::default();
        config.workflow.output_dir = dir.join("output");
        config.device.preference = "cpu".into();
        config
    }

    #[test]
    fn test_delete_existing_then_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("old.wav");
        std::fs::write(&file, b"RIFF").unwrap();
        let path = file.to_str().unwrap();

        let first = run(path, config(dir.path())).unwrap();
        assert_eq!(first, DeleteOutcome::Deleted);
        assert!(!file.exists());

        let second = run(path, config(dir.path())).unwrap();
        assert_eq!(second, DeleteOutcome::NotFound);
    }

    #[test]
    fn test_delete_empty_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run("", config(dir.path())).unwrap(), DeleteOutcome::NotFound);
    }
}
