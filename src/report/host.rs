//! Host metadata for the result log.
//!
//! Collects platform identification and a snapshot of the current CPU and
//! memory load. Anything that cannot be read on this platform is `None`.

use serde::Serialize;
use sysinfo::System;

/// Harness and platform identification
#[derive(Debug, Clone, Serialize)]
pub struct EnvInfo {
    pub harness_version: String,
    pub platform: String,
    pub os_type: String,
    pub os_version: String,
    pub architecture: Option<String>,
    pub executable: Option<String>,
}

/// CPU and memory load at the end of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemLoad {
    pub cpu_percent: Option<f32>,
    pub total_memory_bytes: Option<u64>,
    pub used_memory_bytes: Option<u64>,
    pub available_memory_bytes: Option<u64>,
}

pub fn env_info() -> EnvInfo {
    let os = os_info::get();
    EnvInfo {
        harness_version: env!("CARGO_PKG_VERSION").to_string(),
        platform: os.to_string(),
        os_type: os.os_type().to_string(),
        os_version: os.version().to_string(),
        architecture: os
            .architecture()
            .map(str::to_string)
            .or_else(|| Some(std::env::consts::ARCH.to_string())),
        executable: std::env::current_exe()
            .ok()
            .map(|p| p.display().to_string()),
    }
}

/// Sample CPU usage over the minimum interval sysinfo needs, plus memory.
pub fn system_load() -> SystemLoad {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return SystemLoad::default();
    }

    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    SystemLoad {
        cpu_percent: Some(sys.global_cpu_usage()),
        total_memory_bytes: Some(sys.total_memory()),
        used_memory_bytes: Some(sys.used_memory()),
        available_memory_bytes: Some(sys.available_memory()),
    }
}
