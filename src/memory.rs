//! Peak memory monitor scoped around the solve.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::error::DispatchResult;

/// One resident-set-size sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemorySample {
    /// Resident set size in MiB; 0 where the platform does not expose it.
    pub mib: f64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl MemorySample {
    fn now() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            mib: resident_mib().unwrap_or(0.0),
            timestamp,
        }
    }
}

/// Resident set size of this process in MiB, from `/proc/self/status`.
pub fn resident_mib() -> Option<f64> {
    let status = fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kib: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib / 1024.0)
}

/// Samples memory usage on a background thread until stopped or dropped.
///
/// ```ignore
/// let guard = MemoryLogger::start(Duration::from_secs(30), None)?;
/// solve_network(&mut network, mode)?;
/// let peak = guard.finish();
/// ```
#[derive(Debug)]
pub struct MemoryLogger {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<MemorySample>>,
}

impl MemoryLogger {
    /// Starts sampling every `interval`, optionally appending
    /// `MEM <MiB> <unix seconds>` lines to `log_path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the log file cannot be created.
    pub fn start(interval: Duration, log_path: Option<&Path>) -> DispatchResult<Self> {
        let mut log = match log_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                Some(BufWriter::new(File::create(path)?))
            }
            None => None,
        };

        let (tx, rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            let mut peak = MemorySample::default();
            loop {
                let sample = MemorySample::now();
                if sample.mib >= peak.mib {
                    peak = sample;
                }
                if let Some(writer) = log.as_mut() {
                    let written = writeln!(writer, "MEM {:.6} {:.4}", sample.mib, sample.timestamp)
                        .and_then(|()| writer.flush());
                    if let Err(e) = written {
                        warn!(error = %e, "memory log write failed, disabling log file");
                        log = None;
                    }
                }
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            peak
        });

        Ok(Self {
            stop: Some(tx),
            handle: Some(handle),
        })
    }

    fn stop(&mut self) -> Option<MemorySample> {
        if let Some(tx) = self.stop.take() {
            // The sampler may already have exited.
            let _ = tx.send(());
        }
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(peak) => {
                info!(
                    peak_mib = peak.mib,
                    at = peak.timestamp,
                    "peak memory usage"
                );
                Some(peak)
            }
            Err(_) => {
                warn!("memory sampler thread panicked");
                None
            }
        }
    }

    /// Stops sampling and returns the peak sample.
    pub fn finish(mut self) -> MemorySample {
        self.stop().unwrap_or_default()
    }

    /// Whether the sampler is still attached to this guard.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for MemoryLogger {
    fn drop(&mut self) {
        self.stop();
    }
}
