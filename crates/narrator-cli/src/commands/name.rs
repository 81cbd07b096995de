//! Name command: preview the file name a generate call would use.

use std::path::PathBuf;

use anyhow::Result;

use narrator_core::{NarratorConfig, OutputNaming};

/// Print a fresh output path for `base`; no file is created.
pub fn run(base: &str, config: &NarratorConfig) -> Result<PathBuf> {
    let naming = OutputNaming::new(&config.workflow.output_dir)?
        .with_default_base(config.workflow.default_base_name.clone());
    let path = naming.name_file(base);
    println!("{}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_previews_without_creating() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NarratorConfig::default();
        config.workflow.output_dir = dir.path().to_path_buf();

        let named = run(" chapter1 ", &config).unwrap();
        let file = named.file_name().unwrap().to_str().unwrap();
        assert!(file.starts_with("chapter1_"));
        assert!(!named.exists());

        let fallback = run("", &config).unwrap();
        let file = fallback.file_name().unwrap().to_str().unwrap();
        assert!(file.starts_with("generated_audio_"));
    }
}
