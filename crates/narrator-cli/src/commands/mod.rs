//! CLI command implementations.

pub mod delete;
pub mod info;
pub mod name;
pub mod synth;

use std::path::Path;

use anyhow::{Context, Result};

use narrator_core::NarratorConfig;

/// Load `path` if given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<NarratorConfig> {
    match path {
        Some(path) => NarratorConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(NarratorConfig::default()),
    }
}
