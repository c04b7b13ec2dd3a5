use std::time::SystemTime;

use sysinfo::{Process, System, ThreadKind};
use thiserror::Error;

use crate::process::{MemoryInfo, ProcessRow};

/// Point-in-time read of cpu, memory and the process table.
/// Never patched, the next refresh replaces it.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub timestamp: SystemTime,
    pub cpu_total: f32,
    pub per_core: Vec<f32>,
    pub physical_cores: Option<usize>,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub uptime: u64,
    pub rows: Vec<ProcessRow>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::UNIX_EPOCH,
            cpu_total: 0.,
            per_core: vec![],
            physical_cores: None,
            memory_total: 0,
            memory_used: 0,
            memory_available: 0,
            swap_total: 0,
            swap_used: 0,
            uptime: 0,
            rows: vec![],
        }
    }
}

impl Snapshot {
    pub fn memory_ratio(&self) -> f64 {
        ratio(self.memory_used, self.memory_total)
    }
    pub fn swap_ratio(&self) -> f64 {
        ratio(self.swap_used, self.swap_total)
    }
}

fn ratio(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.
    } else {
        (used as f64 / total as f64).clamp(0., 1.)
    }
}

pub trait SnapshotSource {
    /// Must not fail: anything unreadable is left out or zeroed.
    fn take_snapshot(&mut self) -> Snapshot;
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("system information is not available on this platform")]
    Unsupported,
}

pub struct SystemProvider {
    system: System,
}

impl SystemProvider {
    pub fn new() -> Result<Self, ProviderError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProviderError::Unsupported);
        }
        let mut system = System::new_all();
        //cpu usage is a delta, so prime it with a first sample
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_all();
        Ok(Self { system })
    }
}

impl SnapshotSource for SystemProvider {
    fn take_snapshot(&mut self) -> Snapshot {
        self.system.refresh_all();
        let sys = &self.system;
        let memory_total = sys.total_memory();

        //sometimes on macos cpu is nan
        let per_core: Vec<f32> = sys
            .cpus()
            .iter()
            .map(|cpu| cpu.cpu_usage().zero_if_nan())
            .collect();

        let rows = sys
            .processes()
            .values()
            .filter(|p| p.thread_kind() != Some(ThreadKind::Userland))
            .filter_map(|p| to_row(p, memory_total))
            .collect::<Vec<ProcessRow>>();

        tracing::debug!(processes = rows.len(), cores = per_core.len(), "snapshot taken");

        Snapshot {
            timestamp: SystemTime::now(),
            cpu_total: sys.global_cpu_usage().zero_if_nan(),
            per_core,
            physical_cores: sys.physical_core_count(),
            memory_total,
            memory_used: sys.used_memory(),
            memory_available: sys.available_memory(),
            swap_total: sys.total_swap(),
            swap_used: sys.used_swap(),
            uptime: System::uptime(),
            rows,
        }
    }
}

fn to_row(p: &Process, memory_total: u64) -> Option<ProcessRow> {
    let pid = p.pid().as_u32();
    if pid == 0 {
        //dont want root or errors
        return None;
    }
    let name = p.name().to_string_lossy().to_string();
    let name = if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    };
    let memory = (memory_total > 0).then(|| MemoryInfo {
        bytes: p.memory(),
        percent: (p.memory() as f64 / memory_total as f64 * 100.) as f32,
    });
    Some(ProcessRow {
        pid,
        name,
        cpu_percent: p.cpu_usage().zero_if_nan(),
        memory,
        status: p.status().to_string(),
    })
}

trait NoNan {
    fn zero_if_nan(self) -> Self;
}
impl NoNan for f32 {
    fn zero_if_nan(self) -> Self {
        if self.is_nan() { 0. } else { self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_contains_current_process() {
        let mut provider = SystemProvider::new().unwrap();
        let snapshot = provider.take_snapshot();
        let me = std::process::id();
        let row = snapshot.rows.iter().find(|r| r.pid == me);
        assert!(row.is_some(), "current process should be listed");
        assert!(!row.unwrap().name.is_empty());
        assert!(snapshot.memory_total > 0);
        assert!(!snapshot.per_core.is_empty());
    }

    #[test]
    fn snapshot_never_lists_pid_zero() {
        let mut provider = SystemProvider::new().unwrap();
        assert!(provider.take_snapshot().rows.iter().all(|r| r.pid != 0));
    }

    #[test]
    fn ratios_are_clamped_and_safe_on_zero_totals() {
        let mut snapshot = Snapshot::default();
        assert_eq!(snapshot.memory_ratio(), 0.);
        assert_eq!(snapshot.swap_ratio(), 0.);
        snapshot.memory_total = 100;
        snapshot.memory_used = 150;
        assert_eq!(snapshot.memory_ratio(), 1.);
        snapshot.swap_total = 4;
        snapshot.swap_used = 1;
        assert_eq!(snapshot.swap_ratio(), 0.25);
    }

    #[test]
    fn nan_becomes_zero() {
        assert_eq!(f32::NAN.zero_if_nan(), 0.);
        assert_eq!(3.5f32.zero_if_nan(), 3.5);
    }
}
