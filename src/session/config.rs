//! Session configuration selection

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Device name used for GPU visibility.
pub const GPU_DEVICE: &str = "GPU";

/// Execution settings applied when a [`super::Session`] is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    device_count: BTreeMap<String, u32>,
}

impl SessionConfig {
    /// Configuration that hides every GPU.
    #[must_use]
    pub fn cpu_only() -> Self {
        Self {
            device_count: BTreeMap::from([(GPU_DEVICE.to_string(), 0)]),
        }
    }

    /// Maximum number of devices of `kind`; `None` means unrestricted.
    #[must_use]
    pub fn device_count(&self, kind: &str) -> Option<u32> {
        self.device_count.get(kind).copied()
    }

    /// Whether at least one GPU may be used.
    #[must_use]
    pub fn gpu_allowed(&self) -> bool {
        self.device_count(GPU_DEVICE) != Some(0)
    }
}

/// Pick the session configuration for a run.
///
/// `true` returns `None` (framework defaults, GPUs allowed); `false`
/// returns a configuration with zero GPU devices.
#[must_use]
pub fn session_config(use_gpu: bool) -> Option<SessionConfig> {
    if use_gpu {
        None
    } else {
        Some(SessionConfig::cpu_only())
    }
}
