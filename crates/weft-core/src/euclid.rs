//! Euclidean rhythms.
//!
//! Bjorklund's algorithm distributes `pulses` onsets over `steps` slots
//! as evenly as possible. The step sequence for (3, 8) is `10010010`,
//! the tresillo; these layouts are part of the notation's compatibility
//! contract, so the grouping order below is load-bearing.

use crate::combinators::fastcat;
use crate::combinators::pure;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::value::Value;

/// The boolean step layout for a euclidean rhythm.
pub fn bjorklund(pulses: usize, steps: usize) -> Vec<bool> {
    if steps == 0 {
        return Vec::new();
    }
    if pulses == 0 {
        return vec![false; steps];
    }
    if pulses >= steps {
        return vec![true; steps];
    }

    let mut pattern: Vec<Vec<bool>> = (0..pulses).map(|_| vec![true]).collect();
    let mut remainder: Vec<Vec<bool>> = (0..steps - pulses).map(|_| vec![false]).collect();

    while remainder.len() > 1 {
        let take = pattern.len().min(remainder.len());
        let mut combined = Vec::with_capacity(take);
        for i in 0..take {
            let mut group = pattern[i].clone();
            group.extend(remainder[i].iter().copied());
            combined.push(group);
        }
        let leftover = if pattern.len() > remainder.len() {
            pattern[take..].to_vec()
        } else {
            remainder[take..].to_vec()
        };
        pattern = combined;
        remainder = leftover;
    }

    pattern.extend(remainder);
    pattern.into_iter().flatten().collect()
}

/// A boolean pattern of `steps` equal slots per cycle, `true` on the
/// euclidean onsets, rotated left by `rotation` slots. Feed it to
/// `struct_` or `mask` to gate another pattern.
pub fn euclid(pulses: usize, steps: usize, rotation: usize) -> Pattern {
    let mut layout = bjorklund(pulses, steps);
    if layout.is_empty() {
        return crate::combinators::silence();
    }
    if rotation > 0 {
        let len = layout.len();
        layout.rotate_left(rotation % len);
    }

    fastcat(
        layout
            .into_iter()
            .map(|on| pure(Value::Bool(on)))
            .collect(),
    )
    .set_tactus(Some(Rational::from_integer(steps as i64)))
}
