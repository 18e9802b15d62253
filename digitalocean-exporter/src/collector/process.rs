//! The exporter's own process resource usage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

use super::{CallGuard, CollectError, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "process";

static RESIDENT_MEMORY: Descriptor = Descriptor::gauge(
    "process_resident_memory_bytes",
    "Resident memory size in bytes",
    &[],
);
static VIRTUAL_MEMORY: Descriptor = Descriptor::gauge(
    "process_virtual_memory_bytes",
    "Virtual memory size in bytes",
    &[],
);
static START_TIME: Descriptor = Descriptor::gauge(
    "process_start_time_seconds",
    "Start time of the process since unix epoch in seconds",
    &[],
);
static OPEN_FDS: Descriptor = Descriptor::gauge(
    "process_open_fds",
    "Number of open file descriptors",
    &[],
);

#[derive(Debug, Clone, Copy, PartialEq)]
struct ProcessStats {
    resident_memory: u64,
    virtual_memory: u64,
    start_time: u64,
    open_fds: Option<usize>,
}

/// Reads this process's stats through sysinfo.
///
/// The refresh runs on the blocking pool under a lock so concurrent
/// scrapes do not race on the shared [`System`]; it is bounded by the same
/// timeout as API calls.
pub struct ProcessCollector {
    system: Arc<Mutex<System>>,
    pid: Option<Pid>,
    guard: CallGuard,
}

impl ProcessCollector {
    pub fn new(errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
            pid: sysinfo::get_current_pid().ok(),
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }

    async fn read_stats(&self) -> Result<ProcessStats, CollectError> {
        let pid = self
            .pid
            .ok_or_else(|| CollectError::Local("current pid is unavailable".to_string()))?;
        let system = Arc::clone(&self.system);

        tokio::task::spawn_blocking(move || read_stats(&system, pid))
            .await
            .map_err(|e| CollectError::Local(format!("stats task failed: {}", e)))?
    }
}

fn read_stats(system: &Mutex<System>, pid: Pid) -> Result<ProcessStats, CollectError> {
    let mut system = system.lock();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    let process = system
        .process(pid)
        .ok_or_else(|| CollectError::Local(format!("process {} not found", pid)))?;

    Ok(ProcessStats {
        resident_memory: process.memory(),
        virtual_memory: process.virtual_memory(),
        start_time: process.start_time(),
        open_fds: open_fds(),
    })
}

#[cfg(target_os = "linux")]
fn open_fds() -> Option<usize> {
    std::fs::read_dir("/proc/self/fd")
        .ok()
        .map(|entries| entries.count())
}

#[cfg(not(target_os = "linux"))]
fn open_fds() -> Option<usize> {
    None
}

fn process_samples(stats: &ProcessStats) -> Vec<Sample> {
    let mut samples = vec![
        Sample::unlabeled(&RESIDENT_MEMORY, stats.resident_memory as f64),
        Sample::unlabeled(&VIRTUAL_MEMORY, stats.virtual_memory as f64),
        Sample::unlabeled(&START_TIME, stats.start_time as f64),
    ];

    if let Some(fds) = stats.open_fds {
        samples.push(Sample::unlabeled(&OPEN_FDS, fds as f64));
    }

    samples
}

#[async_trait]
impl Collector for ProcessCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&RESIDENT_MEMORY, &VIRTUAL_MEMORY, &START_TIME, &OPEN_FDS]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("read process stats", self.read_stats())
            .await
            .map(|stats| process_samples(&stats))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_samples() {
        let stats = ProcessStats {
            resident_memory: 10 * 1024 * 1024,
            virtual_memory: 200 * 1024 * 1024,
            start_time: 1_700_000_000,
            open_fds: Some(12),
        };

        let samples = process_samples(&stats);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].value, 10.0 * 1024.0 * 1024.0);
        assert_eq!(samples[2].value, 1_700_000_000.0);
        assert_eq!(samples[3].descriptor, &OPEN_FDS);
    }

    #[test]
    fn test_fds_omitted_when_unknown() {
        let stats = ProcessStats {
            resident_memory: 1,
            virtual_memory: 1,
            start_time: 1,
            open_fds: None,
        };
        assert_eq!(process_samples(&stats).len(), 3);
    }

    #[tokio::test]
    async fn test_collects_own_process() {
        let errors = ErrorCounter::new();
        let collector = ProcessCollector::new(errors.clone(), Duration::from_secs(1));

        let samples = collector.collect().await;

        assert_eq!(errors.get(NAME), 0);
        let rss = samples
            .iter()
            .find(|s| s.descriptor == &RESIDENT_MEMORY)
            .map(|s| s.value);
        assert!(rss.is_some_and(|v| v > 0.0));
    }
}
