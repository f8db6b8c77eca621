//! Concrete collaborators backed by the NVIDIA command-line tools.

pub mod nvidia_settings;
pub mod nvidia_smi;

pub use nvidia_settings::NvidiaSettings;
pub use nvidia_smi::NvidiaSmi;
