//! Host metrics snapshot served at `/server-info`.

use axum::response::Response;
use serde::Serialize;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use crate::http::envelope::{emit_error_with_status, emit_success};
use crate::http::error::ApiError;
use crate::http::request::RequestStart;

pub const ACTION: &str = "server-info";

#[derive(Debug, Clone, Serialize)]
pub struct CpuInfo {
    pub name: String,
    pub vendor_id: String,
    pub brand: String,
    pub frequency_mhz: u64,
    pub usage_percent: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemInfo {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
    pub total_swap_bytes: u64,
    pub used_swap_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadInfo {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostInfo {
    pub hostname: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub uptime_secs: u64,
    pub boot_time: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub cpu_info: Vec<CpuInfo>,
    pub mem_info: MemInfo,
    pub load_info: LoadInfo,
    pub host_info: HostInfo,
    pub gateway_version: &'static str,
    pub num_cpu: usize,
    pub os: &'static str,
    pub arch: &'static str,
}

/// Collect a snapshot. Blocking for at least
/// [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`], since CPU usage is the
/// difference between two samples. Call from a blocking thread.
pub fn collect() -> ServerInfo {
    let mut sys = System::new_with_specifics(
        RefreshKind::new()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything()),
    );
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();

    let cpu_info: Vec<CpuInfo> = sys
        .cpus()
        .iter()
        .map(|cpu| CpuInfo {
            name: cpu.name().to_string(),
            vendor_id: cpu.vendor_id().to_string(),
            brand: cpu.brand().to_string(),
            frequency_mhz: cpu.frequency(),
            usage_percent: cpu.cpu_usage(),
        })
        .collect();

    let total = sys.total_memory();
    let used = sys.used_memory();
    let mem_info = MemInfo {
        total_bytes: total,
        used_bytes: used,
        free_bytes: sys.free_memory(),
        available_bytes: sys.available_memory(),
        used_percent: if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        },
        total_swap_bytes: sys.total_swap(),
        used_swap_bytes: sys.used_swap(),
    };

    let load = System::load_average();

    ServerInfo {
        num_cpu: cpu_info.len(),
        cpu_info,
        mem_info,
        load_info: LoadInfo {
            load1: load.one,
            load5: load.five,
            load15: load.fifteen,
        },
        host_info: HostInfo {
            hostname: System::host_name(),
            os_name: System::name(),
            os_version: System::os_version(),
            kernel_version: System::kernel_version(),
            uptime_secs: System::uptime(),
            boot_time: System::boot_time(),
        },
        gateway_version: env!("CARGO_PKG_VERSION"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    }
}

/// `GET /server-info`
pub async fn server_info(start: RequestStart) -> Response {
    match tokio::task::spawn_blocking(collect).await {
        Ok(info) => emit_success(info, start, ACTION, "Server Info"),
        Err(e) => {
            let err = ApiError::HostMetrics(e.to_string());
            emit_error_with_status(err.status(), &err, start, ACTION)
        }
    }
}
