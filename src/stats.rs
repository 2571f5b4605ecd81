//! Lock-free link counters shared between the reader thread and the consumer

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the reader, decoders and buffer.
#[derive(Debug, Default)]
pub struct LinkStats {
    frames: AtomicU64,
    records: AtomicU64,
    resyncs: AtomicU64,
    checksum_failures: AtomicU64,
    decode_failures: AtomicU64,
    evicted: AtomicU64,
    transport_errors: AtomicU64,
}

/// Point-in-time copy of [`LinkStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStatsSnapshot {
    pub frames: u64,
    pub records: u64,
    pub resyncs: u64,
    pub checksum_failures: u64,
    pub decode_failures: u64,
    pub evicted: u64,
    pub transport_errors: u64,
}

impl LinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn records(&self, count: usize) {
        self.records.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn resync(&self) {
        self.resyncs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn checksum_failure(&self) {
        self.checksum_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn evicted(&self, count: usize) {
        self.evicted.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    pub fn snapshot(&self) -> LinkStatsSnapshot {
        LinkStatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            resyncs: self.resyncs.load(Ordering::Relaxed),
            checksum_failures: self.checksum_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counters_accumulate_across_threads() {
        let stats = Arc::new(LinkStats::new());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.frame();
                        stats.records(2);
                    }
                    stats.evicted(3);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames, 400);
        assert_eq!(snapshot.records, 800);
        assert_eq!(snapshot.evicted, 12);
        assert_eq!(snapshot.resyncs, 0);
    }
}
