// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Training and inference are generic over the Burn backend.
// The CLI picks one at runtime:
//
//   cpu → NdArray          (portable, used by the tests)
//   gpu → Wgpu             (Vulkan / Metal / DX12)
//
// Training wraps either in Autodiff<_> for gradients.

use serde::{Deserialize, Serialize};

pub type CpuBackend = burn::backend::NdArray;
pub type GpuBackend = burn::backend::Wgpu;

pub type CpuDevice = burn::backend::ndarray::NdArrayDevice;
pub type GpuDevice = burn::backend::wgpu::WgpuDevice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    Gpu,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Cpu => f.write_str("cpu"),
            DeviceKind::Gpu => f.write_str("gpu"),
        }
    }
}
