//! Periodic snapshot stream

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;

use crate::buffer::TelemetryBuffer;
use crate::driver::ReaderStatus;
use crate::snapshot::Snapshot;

pin_project! {
    /// Drains the telemetry buffer once per period and yields the folded snapshot.
    ///
    /// Ends when the session is cancelled, or once the reader has finished and
    /// every buffered record has been folded.
    pub struct SnapshotStream {
        #[pin]
        ticks: IntervalStream,
        buffer: Arc<TelemetryBuffer>,
        status: Arc<ReaderStatus>,
        cancel: CancellationToken,
        snapshot: Snapshot,
        done: bool,
    }
}

impl SnapshotStream {
    /// Create a stream ticking every `period`.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(
        buffer: Arc<TelemetryBuffer>,
        status: Arc<ReaderStatus>,
        cancel: CancellationToken,
        period: Duration,
    ) -> Self {
        let mut ticks = interval(period);
        // Set missed tick behavior to delay (don't burst)
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            ticks: IntervalStream::new(ticks),
            buffer,
            status,
            cancel,
            snapshot: Snapshot::new(),
            done: false,
        }
    }
}

impl Stream for SnapshotStream {
    type Item = Snapshot;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.done || this.cancel.is_cancelled() {
            return Poll::Ready(None);
        }

        // Wait for interval tick
        if ready!(this.ticks.poll_next(cx)).is_none() {
            *this.done = true;
            return Poll::Ready(None);
        }

        // Read the reader state before draining so its last records are not lost
        let reader_finished = this.status.is_finished();
        let batch = this.buffer.drain();
        if batch.is_empty() && reader_finished {
            *this.done = true;
            return Poll::Ready(None);
        }

        this.snapshot.fold(&batch);
        Poll::Ready(Some(this.snapshot.clone()))
    }
}
