//! Scheduling and host glue for the Weft pattern engine.
//!
//! This crate wires the pure pattern algebra to the outside world:
//!
//! - [`Scheduler`]: a clock-driven look-ahead loop that repeatedly
//!   queries the active pattern and emits timestamped events;
//! - [`Clock`] / [`Sink`]: the two seams hosts implement (audio clock,
//!   MIDI/OSC/audio dispatch);
//! - [`Registry`]: a registry-backed expression evaluator turning user
//!   source into pattern values, with mini notation for bare strings;
//! - [`Diag`]: structured, non-fatal diagnostics for everything user
//!   code can get wrong.
//!
//! ```
//! use weft_engine::Registry;
//!
//! let registry = Registry::new();
//! let pattern = registry.evaluate(r#"(fast 2 "bd sd")"#).unwrap();
//! assert_eq!(pattern.first_cycle().len(), 4);
//! ```

pub mod clock;
pub mod diag;
pub mod lang;
pub mod registry;
pub mod scheduler;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use diag::{Diag, DiagKind};
pub use lang::{LangValue, Transform};
pub use registry::Registry;
pub use scheduler::{run_for, Scheduler, SchedulerConfig, SchedulerHandle};
pub use sink::{ChannelSink, EmittedEvent, LogSink, MemorySink, RejectingSink, Sink, SinkError};
