//! Session: reader thread, telemetry buffer and command sink for one device

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::buffer::{Batch, TelemetryBuffer};
use crate::config::SessionConfig;
use crate::driver::{Driver, DriverHandle};
use crate::orientation::{Orientation, Rotation};
use crate::protocol::{Command, CommandSink};
use crate::providers::DeviceProvider;
use crate::snapshot::Snapshot;
use crate::stats::{LinkStats, LinkStatsSnapshot};
use crate::stream::SnapshotStream;
use crate::transport::Transport;
use crate::types::DeviceFamily;
use crate::view::DisplayView;
use crate::{LinkError, Result};

#[derive(Debug, Clone, Copy, Default)]
struct DisplaySettings {
    orientation: Orientation,
    bed_tracking: bool,
}

/// State shared by the reader thread and every consumer of one session.
///
/// Cloning is cheap; clones observe the same cancellation and display settings.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    cancel: CancellationToken,
    display: Arc<Mutex<DisplaySettings>>,
}

impl SessionContext {
    pub fn new(orientation: Orientation, bed_tracking: bool) -> Self {
        Self {
            cancel: CancellationToken::new(),
            display: Arc::new(Mutex::new(DisplaySettings { orientation, bed_tracking })),
        }
    }

    /// Token cancelled when the session shuts down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn orientation(&self) -> Orientation {
        self.display().orientation
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        self.display().orientation = orientation;
    }

    /// Rotate the display a further 90° clockwise.
    pub fn rotate_clockwise(&self) -> Rotation {
        let mut display = self.display();
        display.orientation.rotation = display.orientation.rotation.next_clockwise();
        display.orientation.rotation
    }

    /// Flip the horizontal mirror; returns the new setting.
    pub fn toggle_mirror(&self) -> bool {
        let mut display = self.display();
        display.orientation.mirror = !display.orientation.mirror;
        display.orientation.mirror
    }

    pub fn bed_tracking(&self) -> bool {
        self.display().bed_tracking
    }

    pub fn set_bed_tracking(&self, enabled: bool) {
        self.display().bed_tracking = enabled;
    }

    fn display(&self) -> MutexGuard<'_, DisplaySettings> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running telemetry session.
///
/// Dropping a session cancels its reader without waiting for it; call
/// [`shutdown`](Self::shutdown) for an orderly stop.
#[derive(Debug)]
pub struct Session {
    family: DeviceFamily,
    port: String,
    context: SessionContext,
    buffer: Arc<TelemetryBuffer>,
    stats: Arc<LinkStats>,
    commands: CommandSink,
    driver: DriverHandle,
}

impl Session {
    /// Start a session over an open transport.
    ///
    /// A second handle to the transport becomes the command sink; the original
    /// moves to the reader thread.
    pub fn start(transport: Box<dyn Transport>, config: &SessionConfig) -> Result<Self> {
        config.validate()?;

        let family = config.family;
        let port = transport.name().to_string();
        let commands = CommandSink::new(family, transport.try_clone()?);

        let context = SessionContext::new(config.orientation, config.bed_tracking);
        let stats = Arc::new(LinkStats::new());
        let buffer = Arc::new(TelemetryBuffer::new(config.buffer_capacity(), Arc::clone(&stats)));

        let provider = DeviceProvider::new(transport, family, Arc::clone(&stats));
        let driver = Driver::spawn(
            provider,
            Arc::clone(&buffer),
            Arc::clone(&stats),
            context.cancel_token(),
            config.idle_timeout(),
        )?;

        info!(port = %port, %family, capacity = buffer.capacity(), "Session started");
        Ok(Self { family, port, context, buffer, stats, commands, driver })
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Shared context for orientation and cancellation.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Take every buffered record, in arrival order.
    pub fn drain(&self) -> Batch {
        self.buffer.drain()
    }

    /// Send a command to the device. Failures are logged, never returned.
    ///
    /// Enabling bed tracking or setting a bed box turns on bed-tracking display.
    pub fn send_command(&self, command: &Command) -> bool {
        let sent = self.commands.send(command);
        if sent && matches!(command, Command::EnableBedTracking | Command::SetBedBox(_)) {
            self.context.set_bed_tracking(true);
        }
        sent
    }

    /// Snapshot stream draining the buffer every `period`.
    ///
    /// Must be called within a tokio runtime.
    pub fn snapshots(&self, period: Duration) -> SnapshotStream {
        SnapshotStream::new(
            Arc::clone(&self.buffer),
            self.driver.status(),
            self.context.cancel_token(),
            period,
        )
    }

    /// Display view of `snapshot` under the current orientation.
    pub fn view(&self, snapshot: &Snapshot) -> DisplayView {
        DisplayView::build(self.family, snapshot, self.context.orientation(), self.context.bed_tracking())
    }

    pub fn stats(&self) -> LinkStatsSnapshot {
        self.stats.snapshot()
    }

    /// Most recent transport error seen by the reader.
    pub fn last_error(&self) -> Option<Arc<LinkError>> {
        self.driver.status().last_error()
    }

    /// Whether the reader has stopped, e.g. at the end of a capture.
    pub fn is_finished(&self) -> bool {
        self.driver.is_finished()
    }

    /// Cancel the reader, wait up to `join_timeout` for it, then close the
    /// command sink.
    ///
    /// A reader still running at the deadline is detached and
    /// `LinkError::Timeout` is returned after the sink is closed.
    pub fn shutdown(mut self, join_timeout: Duration) -> Result<()> {
        info!(port = %self.port, "Session shutting down");
        self.context.cancel.cancel();
        let joined = self.driver.join(join_timeout);
        self.commands.close();
        debug!(stats = ?self.stats.snapshot(), "Session closed");
        joined
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.context.cancel.cancel();
    }
}
