//! Best-effort memory pressure hints.
//!
//! Large transfers periodically signal that now is a reasonable moment to
//! reclaim memory. The hint is advisory: correctness never depends on it,
//! and concurrent uploads may fire it redundantly.

use std::sync::Mutex;
use sysinfo::{Pid, System};

pub trait MemoryPressure: Send + Sync {
    /// Fire a reclamation hint. Must be cheap and safe to call from any
    /// number of in-flight uploads at once.
    fn hint(&self);
}

/// Hint sink for runtimes with nothing to reclaim out of band.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMemoryPressure;

impl MemoryPressure for NoopMemoryPressure {
    fn hint(&self) {}
}

/// Logs the process resident set size on each hint, giving operators a
/// memory-over-transfer trace without any runtime support.
pub struct RssLogMemoryPressure {
    system: Mutex<System>,
    pid: Pid,
}

impl RssLogMemoryPressure {
    pub fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        Some(Self {
            system: Mutex::new(System::new()),
            pid,
        })
    }
}

impl MemoryPressure for RssLogMemoryPressure {
    fn hint(&self) {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        system.refresh_process(self.pid);
        if let Some(process) = system.process(self.pid) {
            tracing::debug!(rss_bytes = process.memory(), "Memory pressure hint");
        }
    }
}
