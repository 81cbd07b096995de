//! Info command implementation.

use narrator_core::{Lang, NarratorConfig};
use narrator_runtime::{DevicePreference, select_accelerator};

/// Run the info command.
pub fn run(config: &NarratorConfig) {
    println!("Narrator");
    println!("========");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));

    #[cfg(feature = "cuda")]
    println!("  CUDA: enabled");
    #[cfg(not(feature = "cuda"))]
    println!("  CUDA: disabled");
    #[cfg(feature = "metal")]
    println!("  Metal: enabled");
    #[cfg(not(feature = "metal"))]
    println!("  Metal: disabled");

    let preference = DevicePreference::from_name(&config.device.preference);
    match select_accelerator(preference) {
        Ok(device) => println!("  Device: {device}"),
        Err(e) => println!("  Device: unavailable ({e})"),
    }

    println!();
    println!("Workflow:");
    println!("  Output dir:      {}", config.workflow.output_dir.display());
    println!("  Reference voice: {}", config.workflow.reference_voice.display());
    println!("  Language:        {}", config.workflow.language);
    println!("  Speed:           {}", config.workflow.speed);
    println!("  Split sentences: {}", config.workflow.split_sentences);
    println!("  Backend:         {:?}", config.synthesizer.backend);
    println!("  Program:         {}", config.synthesizer.program);

    let languages: Vec<&str> = Lang::ALL.iter().map(|lang| lang.code()).collect();
    println!();
    println!("Languages: {}", languages.join(", "));
}
