//! Resident memory sampling for processes launched by the harness.
//!
//! The probe is polled from the same loop that waits for the child to exit,
//! so it only sees what the process held at each poll. Peaks between polls
//! are missed.

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Errors produced by memory instrumentation.
#[derive(Debug, Clone)]
pub enum MemoryError {
    ProcessNotFound { pid: u32 },
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::ProcessNotFound { pid } => {
                write!(f, "failed to locate process {}", pid)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

/// Tracks the largest resident set observed for one process.
#[derive(Debug)]
pub struct ProcessMemoryProbe {
    sys: System,
    pid: Pid,
    raw_pid: u32,
    peak_rss_bytes: Option<u64>,
}

impl ProcessMemoryProbe {
    /// Create a probe for `pid`. No sample is taken yet.
    pub fn new(pid: u32) -> Self {
        ProcessMemoryProbe {
            sys: System::new(),
            pid: Pid::from(pid as usize),
            raw_pid: pid,
            peak_rss_bytes: None,
        }
    }

    /// Sample the current resident set, updating the peak.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be located (it may already have
    /// exited).
    pub fn sample(&mut self) -> Result<u64, MemoryError> {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        let process = self
            .sys
            .process(self.pid)
            .ok_or(MemoryError::ProcessNotFound { pid: self.raw_pid })?;

        // Bytes, not KiB.
        let rss_bytes = process.memory();
        self.peak_rss_bytes = max_peak(self.peak_rss_bytes, Some(rss_bytes));
        Ok(rss_bytes)
    }

    /// Largest resident set seen so far, `None` if no sample succeeded.
    pub fn peak_rss_bytes(&self) -> Option<u64> {
        self.peak_rss_bytes
    }
}

/// Combine two optional peaks, keeping the larger.
pub fn max_peak(left: Option<u64>, right: Option<u64>) -> Option<u64> {
    match (left, right) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}
