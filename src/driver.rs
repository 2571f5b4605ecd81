//! Driver runs a provider on a dedicated reader thread

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::buffer::TelemetryBuffer;
use crate::provider::Provider;
use crate::stats::LinkStats;
use crate::{LinkError, Result};

/// Name of the reader thread.
pub const READER_THREAD_NAME: &str = "nonvision-reader";

const BACKOFF_BASE: Duration = Duration::from_millis(50);
const BACKOFF_MAX: Duration = Duration::from_millis(500);
const JOIN_POLL: Duration = Duration::from_millis(5);

/// Reader thread status visible to the consumer.
#[derive(Debug)]
pub struct ReaderStatus {
    finished: AtomicBool,
    last_error: Mutex<Option<Arc<LinkError>>>,
    last_data: Mutex<Instant>,
}

impl Default for ReaderStatus {
    fn default() -> Self {
        Self {
            finished: AtomicBool::new(false),
            last_error: Mutex::new(None),
            last_data: Mutex::new(Instant::now()),
        }
    }
}

impl ReaderStatus {
    /// Whether the reader loop has exited.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Most recent transport error seen by the reader.
    pub fn last_error(&self) -> Option<Arc<LinkError>> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Time since the reader last delivered a record, or since it started.
    pub fn idle_for(&self) -> Duration {
        self.last_data.lock().unwrap_or_else(PoisonError::into_inner).elapsed()
    }

    fn record_error(&self, error: LinkError) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(error));
    }

    fn mark_data(&self) {
        *self.last_data.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    // A transport error already explains the stall and is kept.
    fn record_stall(&self, idle: Duration) {
        let mut last_error = self.last_error.lock().unwrap_or_else(PoisonError::into_inner);
        if last_error.is_none() {
            *last_error = Some(Arc::new(LinkError::Stalled { idle }));
        }
    }
}

// Marks the status finished however the reader loop exits.
struct FinishOnDrop(Arc<ReaderStatus>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finished.store(true, Ordering::Release);
    }
}

/// Handle to a running reader thread.
#[derive(Debug)]
pub struct DriverHandle {
    thread: Option<JoinHandle<()>>,
    status: Arc<ReaderStatus>,
}

impl DriverHandle {
    /// Shared status of the reader.
    pub fn status(&self) -> Arc<ReaderStatus> {
        Arc::clone(&self.status)
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Wait up to `timeout` for the reader to exit.
    ///
    /// The caller cancels the session token first. A reader still running at the
    /// deadline is detached and `LinkError::Timeout` is returned.
    pub fn join(&mut self, timeout: Duration) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        let deadline = Instant::now() + timeout;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                warn!(?timeout, "Reader thread did not exit in time, detaching");
                return Err(LinkError::Timeout { duration: timeout });
            }
            std::thread::sleep(JOIN_POLL);
        }

        if thread.join().is_err() {
            error!("Reader thread panicked");
        } else {
            debug!("Reader thread joined");
        }
        Ok(())
    }
}

/// Driver spawns and manages the reader thread
///
/// The reader owns the provider and pushes every decoded record into the
/// telemetry buffer. It checks the cancellation token once per iteration, so
/// shutdown waits at most one transport read timeout.
///
/// A reader that delivers no record for `idle_timeout` stops on its own. Its
/// status then reports finished, with the last transport error or
/// `LinkError::Stalled` as the cause.
pub struct Driver;

impl Driver {
    /// Spawn the reader thread for the given provider
    pub fn spawn<P>(
        provider: P,
        buffer: Arc<TelemetryBuffer>,
        stats: Arc<LinkStats>,
        cancel: CancellationToken,
        idle_timeout: Duration,
    ) -> Result<DriverHandle>
    where
        P: Provider,
    {
        let status = Arc::new(ReaderStatus::default());
        let thread_status = Arc::clone(&status);

        let thread = std::thread::Builder::new()
            .name(READER_THREAD_NAME.to_string())
            .spawn(move || {
                let _finish = FinishOnDrop(Arc::clone(&thread_status));
                Self::reader_loop(provider, &buffer, &stats, &thread_status, &cancel, idle_timeout);
            })?;

        Ok(DriverHandle { thread: Some(thread), status })
    }

    /// Reader loop - one provider call per iteration
    fn reader_loop<P>(
        mut provider: P,
        buffer: &TelemetryBuffer,
        stats: &LinkStats,
        status: &ReaderStatus,
        cancel: &CancellationToken,
        idle_timeout: Duration,
    ) where
        P: Provider,
    {
        let family = provider.family();
        info!(%family, "Reader thread started");
        let mut record_count = 0u64;
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!(%family, "Reader cancelled");
                break;
            }

            match provider.next_records() {
                Ok(Some(records)) => {
                    error_count = 0;
                    if !records.is_empty() {
                        record_count += records.len() as u64;
                        buffer.extend(records);
                        status.mark_data();
                    }
                }
                Ok(None) => {
                    info!(%family, records = record_count, "Provider stream ended");
                    break;
                }
                Err(e) => {
                    // Transport faults are never escalated; the reader keeps trying.
                    error_count = error_count.saturating_add(1);
                    stats.transport_error();
                    error!(%family, attempt = error_count, error = %e, "Transport error");
                    status.record_error(e);

                    // Exponential backoff: 50ms, 100ms, 200ms, 400ms, 500ms, ...
                    let backoff = BACKOFF_BASE
                        .saturating_mul(1 << (error_count - 1).min(4))
                        .min(BACKOFF_MAX);
                    std::thread::sleep(backoff);
                }
            }

            let idle = status.idle_for();
            if idle >= idle_timeout {
                error!(%family, ?idle, "No data received, closing reader");
                status.record_stall(idle);
                break;
            }
        }

        info!(%family, records = record_count, "Reader thread ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceFamily, TelemetryRecord};
    use std::collections::VecDeque;

    struct ScriptedProvider {
        steps: VecDeque<Result<Option<Vec<TelemetryRecord>>>>,
    }

    impl Provider for ScriptedProvider {
        fn next_records(&mut self) -> Result<Option<Vec<TelemetryRecord>>> {
            self.steps.pop_front().unwrap_or(Ok(None))
        }

        fn family(&self) -> DeviceFamily {
            DeviceFamily::Tof
        }
    }

    struct IdleProvider;

    impl Provider for IdleProvider {
        fn next_records(&mut self) -> Result<Option<Vec<TelemetryRecord>>> {
            std::thread::sleep(Duration::from_millis(2));
            Ok(Some(Vec::new()))
        }

        fn family(&self) -> DeviceFamily {
            DeviceFamily::Thermal
        }
    }

    const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

    struct FailingProvider;

    impl Provider for FailingProvider {
        fn next_records(&mut self) -> Result<Option<Vec<TelemetryRecord>>> {
            Err(LinkError::transport("unplugged", std::io::Error::from(std::io::ErrorKind::BrokenPipe)))
        }

        fn family(&self) -> DeviceFamily {
            DeviceFamily::Tof
        }
    }

    fn shared() -> (Arc<TelemetryBuffer>, Arc<LinkStats>) {
        let stats = Arc::new(LinkStats::new());
        (Arc::new(TelemetryBuffer::new(16, Arc::clone(&stats))), stats)
    }

    #[test]
    fn transport_errors_are_recorded_not_fatal() {
        let (buffer, stats) = shared();
        let provider = ScriptedProvider {
            steps: VecDeque::from(vec![
                Ok(Some(vec![TelemetryRecord::Calibrating(true)])),
                Err(LinkError::transport("mock", std::io::Error::other("unplugged"))),
                Ok(Some(vec![TelemetryRecord::Calibrating(false)])),
            ]),
        };

        let mut handle = Driver::spawn(
            provider,
            Arc::clone(&buffer),
            Arc::clone(&stats),
            CancellationToken::new(),
            IDLE_TIMEOUT,
        )
        .unwrap();
        handle.join(Duration::from_secs(2)).unwrap();

        assert!(handle.is_finished());
        assert_eq!(buffer.drain().len(), 2);
        assert_eq!(stats.snapshot().transport_errors, 1);
        assert!(matches!(handle.status().last_error().as_deref(), Some(LinkError::Transport { .. })));
    }

    #[test]
    fn cancellation_stops_idle_reader() {
        let (buffer, stats) = shared();
        let cancel = CancellationToken::new();
        let mut handle = Driver::spawn(IdleProvider, buffer, stats, cancel.clone(), IDLE_TIMEOUT).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        cancel.cancel();
        handle.join(Duration::from_secs(1)).unwrap();
        assert!(handle.is_finished());
    }

    #[test]
    fn failing_link_stops_after_idle_timeout() {
        let (buffer, stats) = shared();
        let cancel = CancellationToken::new();
        let mut handle =
            Driver::spawn(FailingProvider, buffer, Arc::clone(&stats), cancel, Duration::from_millis(150))
                .unwrap();

        handle.join(Duration::from_secs(2)).unwrap();
        assert!(handle.is_finished());
        assert!(stats.snapshot().transport_errors >= 1);
        assert!(matches!(handle.status().last_error().as_deref(), Some(LinkError::Transport { .. })));
    }

    #[test]
    fn silent_link_reports_stall() {
        let (buffer, stats) = shared();
        let mut handle =
            Driver::spawn(IdleProvider, buffer, stats, CancellationToken::new(), Duration::from_millis(30))
                .unwrap();

        handle.join(Duration::from_secs(1)).unwrap();
        assert!(matches!(handle.status().last_error().as_deref(), Some(LinkError::Stalled { .. })));
    }
}
