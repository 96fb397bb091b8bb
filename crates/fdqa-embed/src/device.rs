use candle_core::Device;
use fdqa_core::{Error, Result};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    #[default]
    Cpu,
    Cuda,
    Metal,
}

impl std::str::FromStr for DeviceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            "metal" | "mps" => Ok(Self::Metal),
            other => Err(Error::InvalidConfig(format!("unknown compute device '{other}'"))),
        }
    }
}

/// Accelerators that cannot be opened degrade to CPU.
pub fn select_device(kind: DeviceKind) -> Device {
    let accel = match kind {
        DeviceKind::Cpu => None,
        DeviceKind::Cuda => Some(("CUDA", Device::new_cuda(0))),
        DeviceKind::Metal => Some(("Metal", Device::new_metal(0))),
    };
    match accel {
        Some((name, Ok(dev))) => {
            info!(device = name, "embedding device selected");
            dev
        }
        Some((name, Err(e))) => {
            warn!(device = name, error = %e, "accelerator unavailable, using CPU");
            Device::Cpu
        }
        None => {
            info!(device = "CPU", "embedding device selected");
            Device::Cpu
        }
    }
}
