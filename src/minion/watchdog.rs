//! Executor memory watchdog.
//!
//! Samples the process's resident set against a configured limit and trips
//! at 90%, at which point the executor exits with the out-of-memory code.
//! Sampling uses `/proc/self/statm` where available and is inert elsewhere.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const THRESHOLD: f64 = 0.90;
const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Background sampler; dropped together with the executor.
#[derive(Debug)]
pub struct MemoryWatchdog {
    tripped: Arc<AtomicBool>,
}

impl MemoryWatchdog {
    /// Start sampling against `limit_bytes`. The sampler thread stops on its
    /// own once the watchdog is dropped.
    pub fn start(limit_bytes: u64) -> Self {
        let tripped = Arc::new(AtomicBool::new(false));
        let weak = Arc::downgrade(&tripped);
        let threshold = (limit_bytes as f64 * THRESHOLD) as u64;

        std::thread::spawn(move || {
            loop {
                std::thread::sleep(SAMPLE_INTERVAL);
                let Some(flag) = weak.upgrade() else { break };
                if let Some(rss) = current_rss_bytes() {
                    if rss > threshold {
                        flag.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            }
        });

        Self { tripped }
    }

    /// Watchdog that is already tripped; test hook.
    pub fn pre_tripped() -> Self {
        Self {
            tripped: Arc::new(AtomicBool::new(true)),
        }
    }

    /// True once the threshold has been crossed.
    pub fn tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

/// Resident set size of the current process, when the platform exposes it.
pub fn current_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(resident_pages * 4096)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generous_limit_never_trips() {
        let watchdog = MemoryWatchdog::start(u64::MAX);
        std::thread::sleep(Duration::from_millis(150));
        assert!(!watchdog.tripped());
    }

    #[test]
    fn pre_tripped_reports_immediately() {
        assert!(MemoryWatchdog::pre_tripped().tripped());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn rss_sampling_reads_a_positive_value() {
        assert!(current_rss_bytes().unwrap() > 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn tiny_limit_trips_quickly() {
        let watchdog = MemoryWatchdog::start(1);
        std::thread::sleep(Duration::from_millis(300));
        assert!(watchdog.tripped());
    }
}
