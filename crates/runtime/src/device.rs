//! Accelerator probing.
//!
//! The synthesizer runs out of process, so all we need is to decide which
//! device to ask it for: Metal (Apple Silicon) → CUDA (NVIDIA) → CPU.
//! Builds without the `cuda`/`metal` features cannot see the GPU, so `Auto`
//! resolves to [`Accelerator::Auto`] and the model process chooses.

#[cfg(any(feature = "cuda", feature = "metal"))]
use candle_core::Device;
use tracing::{info, warn};

use narrator_core::{Accelerator, NarratorError, NarratorResult};

/// Device preference from config or CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Automatically select the best available device.
    #[default]
    Auto,
    /// Force CPU usage.
    Cpu,
    /// Force Metal GPU (Apple Silicon).
    Metal,
    /// Force CUDA GPU (NVIDIA).
    Cuda,
}

impl DevicePreference {
    /// Parse from string; anything unrecognised means `Auto`.
    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cpu" => Self::Cpu,
            "metal" | "mps" | "apple" => Self::Metal,
            "cuda" | "gpu" | "nvidia" => Self::Cuda,
            _ => Self::Auto,
        }
    }
}

/// Resolve a preference to a concrete accelerator.
///
/// Forcing a GPU that is not available is an error; `Auto` always succeeds.
pub fn select_accelerator(preference: DevicePreference) -> NarratorResult<Accelerator> {
    match preference {
        DevicePreference::Cpu => {
            info!("Using CPU device (forced)");
            Ok(Accelerator::Cpu)
        }
        DevicePreference::Metal => select_metal(),
        DevicePreference::Cuda => select_cuda(),
        DevicePreference::Auto => Ok(select_auto()),
    }
}

/// Whether this build can open a GPU itself.
const GPU_PROBE_COMPILED: bool = cfg!(any(feature = "cuda", feature = "metal"));

fn select_auto() -> Accelerator {
    if !GPU_PROBE_COMPILED {
        info!("No GPU probe in this build, leaving device choice to the model");
        return Accelerator::Auto;
    }
    if is_metal_available() {
        info!("Auto-selected Metal GPU (Apple Silicon)");
        return Accelerator::Metal;
    }
    if is_cuda_available() {
        info!("Auto-selected CUDA GPU (NVIDIA)");
        return Accelerator::Cuda;
    }
    info!("Using CPU device (no GPU available)");
    Accelerator::Cpu
}

fn select_metal() -> NarratorResult<Accelerator> {
    if is_metal_available() {
        info!("Using Metal GPU (Apple Silicon)");
        Ok(Accelerator::Metal)
    } else {
        warn!("Metal GPU requested but not available");
        Err(NarratorError::config(
            "Metal GPU requested but not available (build with --features metal)",
        ))
    }
}

fn select_cuda() -> NarratorResult<Accelerator> {
    if is_cuda_available() {
        info!("Using CUDA GPU (NVIDIA)");
        Ok(Accelerator::Cuda)
    } else {
        warn!("CUDA GPU requested but not available");
        Err(NarratorError::config(
            "CUDA GPU requested but not available (build with --features cuda)",
        ))
    }
}

/// Check if a Metal device can be opened.
pub fn is_metal_available() -> bool {
    #[cfg(feature = "metal")]
    {
        Device::new_metal(0).is_ok()
    }
    #[cfg(not(feature = "metal"))]
    {
        false
    }
}

/// Check if a CUDA device can be opened.
pub fn is_cuda_available() -> bool {
    #[cfg(feature = "cuda")]
    {
        Device::new_cuda(0).is_ok()
    }
    #[cfg(not(feature = "cuda"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_preference_from_name() {
        assert_eq!(DevicePreference::from_name("cpu"), DevicePreference::Cpu);
        assert_eq!(DevicePreference::from_name("CPU"), DevicePreference::Cpu);
        assert_eq!(DevicePreference::from_name("mps"), DevicePreference::Metal);
        assert_eq!(DevicePreference::from_name("gpu"), DevicePreference::Cuda);
        assert_eq!(DevicePreference::from_name("auto"), DevicePreference::Auto);
        assert_eq!(
            DevicePreference::from_name("unknown"),
            DevicePreference::Auto
        );
    }

    #[test]
    fn test_select_cpu() {
        let accel = select_accelerator(DevicePreference::Cpu).unwrap();
        assert_eq!(accel, Accelerator::Cpu);
    }

    #[cfg(not(any(feature = "cuda", feature = "metal")))]
    #[test]
    fn test_auto_without_probe_defers_to_model() {
        let accel = select_accelerator(DevicePreference::Auto).unwrap();
        assert_eq!(accel, Accelerator::Auto);
        assert_eq!(accel.to_string(), "auto");
    }

    #[cfg(any(feature = "cuda", feature = "metal"))]
    #[test]
    fn test_auto_with_probe_is_concrete() {
        let accel = select_accelerator(DevicePreference::Auto).unwrap();
        assert_ne!(accel, Accelerator::Auto);
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_forced_cuda_without_feature_fails() {
        assert!(select_accelerator(DevicePreference::Cuda).is_err());
    }
}
