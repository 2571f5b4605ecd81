//! Bounded telemetry buffer between the reader thread and the consumer
//!
//! One producer pushes, one consumer drains. The lock is held only for the push
//! or the swap, never across a read or a decode. When full, the oldest record is
//! evicted so the reader never blocks.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

use crate::stats::LinkStats;
use crate::types::{RecordKind, TelemetryRecord};

/// Ring-discipline FIFO of decoded records.
#[derive(Debug)]
pub struct TelemetryBuffer {
    records: Mutex<VecDeque<TelemetryRecord>>,
    capacity: usize,
    stats: Arc<LinkStats>,
}

impl TelemetryBuffer {
    /// Buffer holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize, stats: Arc<LinkStats>) -> Self {
        let capacity = capacity.max(1);
        Self { records: Mutex::new(VecDeque::with_capacity(capacity)), capacity, stats }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one record, evicting the oldest if full.
    pub fn push(&self, record: TelemetryRecord) {
        self.extend(std::iter::once(record));
    }

    /// Append records in order under a single lock acquisition.
    pub fn extend(&self, records: impl IntoIterator<Item = TelemetryRecord>) {
        let mut evicted = 0;
        let mut pushed = 0;
        {
            let mut queue = self.lock();
            for record in records {
                if queue.len() == self.capacity {
                    queue.pop_front();
                    evicted += 1;
                }
                queue.push_back(record);
                pushed += 1;
            }
        }

        self.stats.records(pushed);
        if evicted > 0 {
            self.stats.evicted(evicted);
            trace!(evicted, capacity = self.capacity, "Buffer full, evicted oldest records");
        }
    }

    /// Swap out everything buffered, in push order.
    pub fn drain(&self) -> Batch {
        let records = std::mem::take(&mut *self.lock());
        Batch(records.into())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<TelemetryRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Records drained in one cycle, in push order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch(Vec<TelemetryRecord>);

impl Batch {
    pub fn new(records: Vec<TelemetryRecord>) -> Self {
        Self(records)
    }

    /// Whether any record of `kind` arrived this cycle.
    pub fn contains(&self, kind: RecordKind) -> bool {
        self.0.iter().any(|r| r.kind() == kind)
    }

    /// Last record of `kind` this cycle.
    pub fn latest(&self, kind: RecordKind) -> Option<&TelemetryRecord> {
        self.0.iter().rev().find(|r| r.kind() == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TelemetryRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_records(self) -> Vec<TelemetryRecord> {
        self.0
    }
}

impl IntoIterator for Batch {
    type Item = TelemetryRecord;
    type IntoIter = std::vec::IntoIter<TelemetryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a TelemetryRecord;
    type IntoIter = std::slice::Iter<'a, TelemetryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
