//! Core pattern algebra for the Weft live-coding engine.
//!
//! A pattern is a pure function from a time span (measured in cycles,
//! with exact rational endpoints) to a list of timed events. Everything
//! else (the mini notation, the scheduler, output sinks) builds on the
//! types in this crate.
//!
//! ```
//! use weft_core::{fastcat, pure, Rational, Value};
//!
//! let pat = fastcat(vec![
//!     pure(Value::from("bd")),
//!     pure(Value::from("sd")),
//! ]);
//! let haps = pat.first_cycle();
//! assert_eq!(haps.len(), 2);
//! assert_eq!(haps[1].part.begin, Rational::new(1, 2));
//! ```

pub mod combinators;
pub mod euclid;
pub mod hap;
pub mod pattern;
pub mod rational;
pub mod rng;
pub mod signal;
pub mod state;
pub mod timespan;
pub mod value;

pub use combinators::{
    cat, choose, choose_by, choose_weighted, fastcat, gap, overlay, polymeter, polyrhythm, pure,
    sequence, silence, slowcat, slowcat_prime, stack, steady, timecat,
};
pub use euclid::{bjorklund, euclid};
pub use hap::{Context, Hap, Location};
pub use pattern::Pattern;
pub use rational::Rational;
pub use signal::{cosine, irand, isaw, rand, saw, signal, sine, square, time_signal, tri};
pub use state::State;
pub use timespan::TimeSpan;
pub use value::{Bias, NumOp, Value, ValueError};
