//! Output sinks.
//!
//! The scheduler turns haps into `(time, value, duration, context)`
//! quadruples and hands them to a sink. The sink owns actual dispatch
//! (audio, MIDI, OSC) and is free to reject events; rejections surface
//! as non-fatal diagnostics.

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use weft_core::{Context, Value};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    #[error("sink rejected event: {0}")]
    Rejected(String),
    #[error("sink is closed")]
    Closed,
}

/// One event as delivered to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    /// Absolute trigger time in the clock's domain.
    pub time: Instant,
    pub value: Value,
    /// Wall-clock length of the event.
    pub duration: Duration,
    pub context: Context,
}

pub trait Sink: Send + Sync {
    fn emit(
        &self,
        time: Instant,
        value: &Value,
        duration: Duration,
        context: &Context,
    ) -> Result<(), SinkError>;

    /// Cancel anything pre-scheduled later than `after`. Called on
    /// stop; sinks with no scheduling of their own can ignore it.
    fn flush(&self, after: Instant) {
        let _ = after;
    }
}

/// Writes every event through the `log` facade. Handy as a default
/// sink for headless runs.
pub struct LogSink;

impl Sink for LogSink {
    fn emit(
        &self,
        time: Instant,
        value: &Value,
        duration: Duration,
        _context: &Context,
    ) -> Result<(), SinkError> {
        log::info!("event {:?} for {:?}: {}", time, duration, value);
        Ok(())
    }
}

/// Forwards events over a crossbeam channel; the CLI prints from the
/// receiving end.
pub struct ChannelSink {
    sender: Sender<EmittedEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<EmittedEvent>) -> Self {
        ChannelSink { sender }
    }
}

impl Sink for ChannelSink {
    fn emit(
        &self,
        time: Instant,
        value: &Value,
        duration: Duration,
        context: &Context,
    ) -> Result<(), SinkError> {
        self.sender
            .send(EmittedEvent {
                time,
                value: value.clone(),
                duration,
                context: context.clone(),
            })
            .map_err(|_| SinkError::Closed)
    }
}

/// Captures events in memory. Test instrumentation.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<EmittedEvent>>,
    flushes: Mutex<Vec<Instant>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EmittedEvent> {
        self.events.lock().clone()
    }

    pub fn flushes(&self) -> Vec<Instant> {
        self.flushes.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Sink for MemorySink {
    fn emit(
        &self,
        time: Instant,
        value: &Value,
        duration: Duration,
        context: &Context,
    ) -> Result<(), SinkError> {
        self.events.lock().push(EmittedEvent {
            time,
            value: value.clone(),
            duration,
            context: context.clone(),
        });
        Ok(())
    }

    fn flush(&self, after: Instant) {
        self.flushes.lock().push(after);
        self.events.lock().retain(|e| e.time <= after);
    }
}

/// A sink that refuses everything. Exercises the error path in tests.
pub struct RejectingSink;

impl Sink for RejectingSink {
    fn emit(
        &self,
        _time: Instant,
        value: &Value,
        _duration: Duration,
        _context: &Context,
    ) -> Result<(), SinkError> {
        Err(SinkError::Rejected(value.to_string()))
    }
}
