/*!
 * Trace Sinks
 * Pluggable observers the engine and scheduler write their trace to
 */

use super::events::{Severity, TraceEvent};
use parking_lot::Mutex;
use std::io::Write;

/// Destination for trace events
///
/// Sinks are shared between the scheduler and the execution context it
/// spawns, so they must be `Send + Sync`. Recording never fails from the
/// caller's point of view.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: &TraceEvent);
}

/// Forwards every event to `tracing` at the event's severity
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, event: &TraceEvent) {
        let task = event.task();
        match event.severity() {
            Severity::Trace => tracing::trace!(?task, "{}", event),
            Severity::Debug => tracing::debug!(?task, "{}", event),
            Severity::Info => tracing::info!(?task, "{}", event),
            Severity::Warn => tracing::warn!(?task, "{}", event),
        }
    }
}

/// Writes one JSON object per event, newline-delimited
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect a buffer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> TraceSink for JsonLinesSink<W> {
    fn record(&self, event: &TraceEvent) {
        let mut writer = self.writer.lock();
        let written = serde_json::to_writer(&mut *writer, event)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.write_all(b"\n"));
        if let Err(e) = written {
            tracing::warn!(error = %e, "Failed to write trace event");
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Take the recorded events, leaving the sink empty
    pub fn drain(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl TraceSink for MemorySink {
    fn record(&self, event: &TraceEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TraceSink for NullSink {
    #[inline(always)]
    fn record(&self, _event: &TraceEvent) {}
}
