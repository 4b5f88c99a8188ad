//! Event payloads.
//!
//! Scalar values come out of the mini notation (`bd`, `42`); maps carry
//! parameter bundles (`{s: "bd", n: 3, gain: 0.8}`) and are what sinks
//! ultimately consume. Merging promotes scalars to maps so the two worlds
//! compose.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which side wins when merged maps share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Left,
    Right,
}

/// A numeric operation broadcast over values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Error produced when values cannot combine numerically. The caller
/// drops the offending hap rather than failing the whole pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueError {
    pub message: String,
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValueError {}

/// A pattern event's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn map_from(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Map(entries.into_iter().collect())
    }

    /// A `{s: name}` bundle, the payload shape registered sounds produce.
    pub fn sound(name: impl Into<String>) -> Value {
        Value::map_from([("s".to_string(), Value::String(name.into()))])
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Truthiness, used by `struct`/`mask` and euclidean gating.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }

    /// Promote a scalar to a one-entry map. Strings promote under `s`
    /// (they name sounds in practice), everything else under `value`.
    /// Maps pass through.
    pub fn promote(&self) -> BTreeMap<String, Value> {
        match self {
            Value::Map(m) => m.clone(),
            Value::String(s) => BTreeMap::from([("s".to_string(), Value::String(s.clone()))]),
            other => BTreeMap::from([("value".to_string(), other.clone())]),
        }
    }

    /// Structural merge: both sides promoted to maps, entries of the
    /// favored side override the other.
    pub fn union(&self, other: &Value, bias: Bias) -> Value {
        let (base, over) = match bias {
            Bias::Left => (other.promote(), self.promote()),
            Bias::Right => (self.promote(), other.promote()),
        };
        let mut merged = base;
        for (k, v) in over {
            merged.insert(k, v);
        }
        Value::Map(merged)
    }

    /// Set a single key, promoting scalars to maps first.
    pub fn with_entry(&self, key: impl Into<String>, value: Value) -> Value {
        let mut m = self.promote();
        m.insert(key.into(), value);
        Value::Map(m)
    }

    /// Numeric combination, broadcast over maps. Two numbers combine
    /// directly; maps combine entry-wise over the union of keys (missing
    /// entries pass through unchanged); a map and a number broadcast the
    /// number over every numeric entry. Anything else is an error.
    pub fn numeric_op(&self, op: NumOp, other: &Value) -> Result<Value, ValueError> {
        fn apply(op: NumOp, a: f64, b: f64) -> f64 {
            match op {
                NumOp::Add => a + b,
                NumOp::Sub => a - b,
                NumOp::Mul => a * b,
                NumOp::Div => a / b,
            }
        }

        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(op, *a, *b))),
            (Value::Map(a), Value::Map(b)) => {
                let mut merged = a.clone();
                for (k, bv) in b {
                    let combined = match a.get(k) {
                        Some(av) => av.numeric_op(op, bv)?,
                        None => bv.clone(),
                    };
                    merged.insert(k.clone(), combined);
                }
                Ok(Value::Map(merged))
            }
            (Value::Map(a), Value::Number(_)) => {
                let mut merged = BTreeMap::new();
                for (k, av) in a {
                    let combined = match av {
                        Value::Number(_) => av.numeric_op(op, other)?,
                        other_kind => other_kind.clone(),
                    };
                    merged.insert(k.clone(), combined);
                }
                Ok(Value::Map(merged))
            }
            (Value::Number(_), Value::Map(_)) => {
                // Flip so the map drives iteration; subtraction and
                // division are not commutative, so flip operands too.
                let flipped = match op {
                    NumOp::Add | NumOp::Mul => other.numeric_op(op, self)?,
                    NumOp::Sub | NumOp::Div => {
                        return Err(ValueError {
                            message: format!("cannot {:?} a map from a number", op),
                        })
                    }
                };
                Ok(flipped)
            }
            (a, b) => Err(ValueError {
                message: format!("cannot combine {} and {} numerically", a, b),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
