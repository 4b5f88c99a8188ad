//! Query state threaded through pattern evaluation.

use crate::timespan::TimeSpan;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a pattern is asked with: the span of interest plus host-supplied
/// control values. Controls ride along untouched through combinators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub span: TimeSpan,
    pub controls: HashMap<String, Value>,
}

impl State {
    pub fn new(span: TimeSpan) -> Self {
        State {
            span,
            controls: HashMap::new(),
        }
    }

    pub fn with_controls(span: TimeSpan, controls: HashMap<String, Value>) -> Self {
        State { span, controls }
    }

    pub fn set_span(&self, span: TimeSpan) -> State {
        State {
            span,
            controls: self.controls.clone(),
        }
    }

    pub fn with_span<F>(&self, f: F) -> State
    where
        F: FnOnce(TimeSpan) -> TimeSpan,
    {
        self.set_span(f(self.span))
    }

    pub fn set_control(&self, key: impl Into<String>, value: Value) -> State {
        let mut controls = self.controls.clone();
        controls.insert(key.into(), value);
        State {
            span: self.span,
            controls,
        }
    }

    pub fn get_control(&self, key: &str) -> Option<&Value> {
        self.controls.get(key)
    }
}

impl From<TimeSpan> for State {
    fn from(span: TimeSpan) -> Self {
        State::new(span)
    }
}
