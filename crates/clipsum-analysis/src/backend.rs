//! Compute backend detection.
//!
//! Detected once at startup and passed to the local model client; nothing
//! else branches on the device.

use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Environment variable that forces a backend.
pub const BACKEND_ENV: &str = "CLIPSUM_COMPUTE_BACKEND";

/// Accelerator used by a locally hosted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeBackend {
    /// NVIDIA GPU
    Cuda,
    /// Apple Silicon GPU
    Metal,
    /// No accelerator
    Cpu,
}

impl ComputeBackend {
    /// Detect the backend for this host, honoring [`BACKEND_ENV`].
    pub fn detect() -> Self {
        let forced = std::env::var(BACKEND_ENV).ok();
        let apple_silicon = cfg!(all(target_os = "macos", target_arch = "aarch64"));
        let nvidia = which::which("nvidia-smi").is_ok();

        let backend = Self::resolve(forced.as_deref(), apple_silicon, nvidia);
        info!(backend = %backend, "Compute backend selected");
        backend
    }

    /// Pure selection logic: override first, then platform, then driver.
    fn resolve(forced: Option<&str>, apple_silicon: bool, nvidia: bool) -> Self {
        if let Some(backend) = forced.and_then(|s| s.parse().ok()) {
            return backend;
        }
        if apple_silicon {
            Self::Metal
        } else if nvidia {
            Self::Cuda
        } else {
            Self::Cpu
        }
    }

    /// Ollama `num_gpu` option: 0 pins a model to the CPU, `None` lets the server decide.
    pub fn ollama_num_gpu(&self) -> Option<i32> {
        match self {
            Self::Cpu => Some(0),
            Self::Cuda | Self::Metal => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Metal => "metal",
            Self::Cpu => "cpu",
        }
    }
}

impl fmt::Display for ComputeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComputeBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cuda" | "gpu" => Ok(Self::Cuda),
            "metal" | "mps" => Ok(Self::Metal),
            "cpu" => Ok(Self::Cpu),
            other => Err(format!("unknown compute backend '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_order() {
        assert_eq!(ComputeBackend::resolve(Some("cpu"), true, true), ComputeBackend::Cpu);
        assert_eq!(ComputeBackend::resolve(None, true, true), ComputeBackend::Metal);
        assert_eq!(ComputeBackend::resolve(None, false, true), ComputeBackend::Cuda);
        assert_eq!(ComputeBackend::resolve(None, false, false), ComputeBackend::Cpu);
        // Unknown override falls through to detection.
        assert_eq!(ComputeBackend::resolve(Some("tpu"), false, true), ComputeBackend::Cuda);
    }

    #[test]
    fn test_ollama_num_gpu() {
        assert_eq!(ComputeBackend::Cpu.ollama_num_gpu(), Some(0));
        assert_eq!(ComputeBackend::Cuda.ollama_num_gpu(), None);
        assert_eq!("MPS".parse::<ComputeBackend>().unwrap(), ComputeBackend::Metal);
    }
}
