// SPDX-License-Identifier: MIT
//
// Processing statistics for the header: a rolling mean of cycle times and
// the process's resident memory.

use std::collections::VecDeque;
use std::time::Duration;

/// Cycle times averaged in the header.
pub const SAMPLES: usize = 10;

/// Mean of the most recent [`SAMPLES`] durations.
#[derive(Debug, Clone, Default)]
pub struct RollingMean {
    samples: VecDeque<Duration>,
}

impl RollingMean {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, d: Duration) {
        if self.samples.len() == SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(d);
    }

    /// Whole milliseconds, 0 with no samples.
    #[must_use]
    pub fn mean_ms(&self) -> u64 {
        let n = u32::try_from(self.samples.len()).unwrap_or(u32::MAX);
        if n == 0 {
            return 0;
        }
        let total: Duration = self.samples.iter().sum();
        u64::try_from((total / n).as_millis()).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Resident set size in MiB, from `/proc/self/status`.
#[cfg(target_os = "linux")]
#[must_use]
pub fn resident_mb() -> Option<f64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

#[cfg(not(target_os = "linux"))]
#[must_use]
pub const fn resident_mb() -> Option<f64> {
    None
}

/// `VmRSS:    1234 kB` → MiB.
#[must_use]
pub fn parse_vm_rss(status: &str) -> Option<f64> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u32 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(f64::from(kb) / 1024.0)
}

/// `12.3MB` below 1024 MiB, `1.2GB` above.
#[must_use]
pub fn format_memory(mb: f64) -> String {
    if mb < 1024.0 {
        format!("{mb:.1}MB")
    } else {
        format!("{:.1}GB", mb / 1024.0)
    }
}
