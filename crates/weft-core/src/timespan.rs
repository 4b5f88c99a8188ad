//! Half-open arcs of pattern time.

use crate::rational::Rational;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open interval `[begin, end)` in cycles. `begin <= end`; a span
/// whose end equals its begin is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin: Rational,
    pub end: Rational,
}

impl TimeSpan {
    pub fn new(begin: Rational, end: Rational) -> Self {
        TimeSpan { begin, end }
    }

    pub fn from_integers(begin: i64, end: i64) -> Self {
        TimeSpan {
            begin: Rational::from_integer(begin),
            end: Rational::from_integer(end),
        }
    }

    pub fn duration(&self) -> Rational {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn midpoint(&self) -> Rational {
        self.begin + self.duration() / Rational::from_integer(2)
    }

    /// Whether a point falls inside the span (half-open).
    pub fn contains(&self, t: Rational) -> bool {
        t >= self.begin && t < self.end
    }

    /// Split into subspans at every integer (sam) strictly between begin
    /// and end. Per-cycle combinators query each piece separately so that
    /// behavior stays well defined across cycle boundaries.
    pub fn span_cycles(&self) -> Vec<TimeSpan> {
        // Zero-width queries pass through untouched.
        if self.begin == self.end {
            return vec![*self];
        }

        let mut spans = Vec::new();
        let mut begin = self.begin;
        let end_sam = self.end.sam();

        while self.end > begin {
            if begin.sam() == end_sam {
                spans.push(TimeSpan::new(begin, self.end));
                break;
            }
            let next = begin.next_sam();
            spans.push(TimeSpan::new(begin, next));
            begin = next;
        }
        spans
    }

    /// An equal-duration span translated to start inside cycle zero.
    pub fn cycle_arc(&self) -> TimeSpan {
        let b = self.begin.cycle_pos();
        TimeSpan::new(b, b + self.duration())
    }

    /// Apply a function to both endpoints.
    pub fn with_time<F>(&self, f: F) -> TimeSpan
    where
        F: Fn(Rational) -> Rational,
    {
        TimeSpan::new(f(self.begin), f(self.end))
    }

    /// Apply a function to both endpoints relative to the sam of the
    /// begin point.
    pub fn with_cycle<F>(&self, f: F) -> TimeSpan
    where
        F: Fn(Rational) -> Rational,
    {
        let sam = self.begin.sam();
        TimeSpan::new(sam + f(self.begin - sam), sam + f(self.end - sam))
    }

    pub fn shift(&self, offset: Rational) -> TimeSpan {
        self.with_time(|t| t + offset)
    }

    pub fn scale(&self, factor: Rational) -> TimeSpan {
        self.with_time(|t| t * factor)
    }

    /// Intersection of two spans. A zero-width result sitting at the end
    /// of a non-empty span does not count as overlap.
    pub fn intersection(&self, other: &TimeSpan) -> Option<TimeSpan> {
        let begin = self.begin.max(other.begin);
        let end = self.end.min(other.end);

        if begin > end {
            return None;
        }
        if begin == end {
            if begin == self.end && self.begin < self.end {
                return None;
            }
            if begin == other.end && other.begin < other.end {
                return None;
            }
        }
        Some(TimeSpan::new(begin, end))
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.begin, self.end)
    }
}
