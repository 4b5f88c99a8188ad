//! Events ("haps") produced by querying a pattern.
//!
//! The name follows the Tidal lineage: an event is a happening, with a
//! `whole` (its full logical extent, absent for continuous signals) and a
//! `part` (the slice visible under the current query). The part never
//! extends outside the whole.

use crate::rational::Rational;
use crate::timespan::TimeSpan;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte range into the source text an event originated from. Editors
/// use these to highlight the active tokens while a pattern plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl Location {
    pub fn new(start: usize, end: usize) -> Self {
        Location { start, end }
    }
}

/// Per-event metadata carried through every combinator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Source locations that caused this event, innermost last.
    pub locations: Vec<Location>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// Merge two contexts, concatenating locations.
    pub fn combine(&self, other: &Context) -> Context {
        let mut locations = self.locations.clone();
        locations.extend(other.locations.iter().copied());
        Context { locations }
    }
}

/// A single timed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hap {
    /// Full extent of the event in pattern time. `None` marks an analog
    /// event sampled from a continuous signal.
    pub whole: Option<TimeSpan>,
    /// The fragment active under the query. Always inside the query span.
    pub part: TimeSpan,
    pub value: Value,
    pub context: Context,
}

impl Hap {
    pub fn new(whole: Option<TimeSpan>, part: TimeSpan, value: Value) -> Self {
        Hap {
            whole,
            part,
            value,
            context: Context::new(),
        }
    }

    pub fn with_context(
        whole: Option<TimeSpan>,
        part: TimeSpan,
        value: Value,
        context: Context,
    ) -> Self {
        Hap {
            whole,
            part,
            value,
            context,
        }
    }

    /// True when the part starts where the whole starts, i.e. this query
    /// window sees the event's onset. The scheduler only triggers onsets.
    pub fn has_onset(&self) -> bool {
        match &self.whole {
            Some(w) => w.begin == self.part.begin,
            None => false,
        }
    }

    pub fn whole_or_part(&self) -> TimeSpan {
        self.whole.unwrap_or(self.part)
    }

    /// Duration of the logical event (whole if present, else part).
    pub fn duration(&self) -> Rational {
        self.whole_or_part().duration()
    }

    pub fn with_span<F>(self, f: F) -> Hap
    where
        F: Fn(TimeSpan) -> TimeSpan,
    {
        Hap {
            whole: self.whole.map(&f),
            part: f(self.part),
            value: self.value,
            context: self.context,
        }
    }

    pub fn with_value<F>(self, f: F) -> Hap
    where
        F: FnOnce(Value) -> Value,
    {
        Hap {
            whole: self.whole,
            part: self.part,
            value: f(self.value),
            context: self.context,
        }
    }

    pub fn set_context(self, context: Context) -> Hap {
        Hap { context, ..self }
    }

    pub fn push_location(mut self, location: Location) -> Hap {
        self.context.locations.push(location);
        self
    }

    pub fn combine_context(&self, other: &Hap) -> Context {
        self.context.combine(&other.context)
    }

    /// Equality over spans and value, ignoring context.
    pub fn same_event(&self, other: &Hap) -> bool {
        self.whole == other.whole && self.part == other.part && self.value == other.value
    }
}

impl fmt::Display for Hap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.whole {
            None => write!(f, "[ ~{} | {} ]", self.part, self.value),
            Some(w) if *w == self.part => write!(f, "[ {} | {} ]", self.part, self.value),
            Some(w) => write!(f, "[ ({}) in {} | {} ]", self.part, w, self.value),
        }
    }
}
