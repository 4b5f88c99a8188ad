//! Continuous ("analog") patterns.
//!
//! A signal has no discrete onsets: each query returns exactly one hap
//! with `whole = None` and the value sampled at the query's midpoint.

use crate::hap::Hap;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::rng;
use crate::state::State;
use crate::value::Value;

/// A continuous pattern sampling `f` at the query midpoint.
pub fn signal<F>(f: F) -> Pattern
where
    F: Fn(Rational) -> Value + Send + Sync + 'static,
{
    Pattern::new(move |state: &State| {
        vec![Hap::new(None, state.span, f(state.span.midpoint()))]
    })
}

/// Ramp from 0 to 1 over each cycle.
pub fn saw() -> Pattern {
    signal(|t| Value::Number(t.cycle_pos().to_f64()))
}

/// Ramp from 1 to 0 over each cycle.
pub fn isaw() -> Pattern {
    signal(|t| Value::Number(1.0 - t.cycle_pos().to_f64()))
}

/// Sine wave scaled to [0, 1].
pub fn sine() -> Pattern {
    signal(|t| {
        Value::Number((t.to_f64() * std::f64::consts::TAU).sin() * 0.5 + 0.5)
    })
}

/// Cosine wave scaled to [0, 1].
pub fn cosine() -> Pattern {
    signal(|t| {
        Value::Number((t.to_f64() * std::f64::consts::TAU).cos() * 0.5 + 0.5)
    })
}

/// Triangle wave in [0, 1].
pub fn tri() -> Pattern {
    signal(|t| {
        let x = t.cycle_pos().to_f64();
        Value::Number(1.0 - (2.0 * x - 1.0).abs())
    })
}

/// Square wave, 0 for the first half of each cycle, 1 for the second.
pub fn square() -> Pattern {
    signal(|t| {
        Value::Number(if t.cycle_pos().to_f64() < 0.5 { 0.0 } else { 1.0 })
    })
}

/// The query midpoint itself, as a number of cycles.
pub fn time_signal() -> Pattern {
    signal(|t| Value::Number(t.to_f64()))
}

/// Deterministic noise in [0, 1): hashes the query midpoint, so equal
/// queries sample equal values and no platform RNG is involved.
pub fn rand() -> Pattern {
    let node = rng::next_node_id();
    signal(move |t| Value::Number(rng::time_unit(node, t)))
}

/// Deterministic integer noise in [0, n).
pub fn irand(n: i64) -> Pattern {
    assert!(n > 0, "irand range must be positive");
    let node = rng::next_node_id();
    signal(move |t| Value::Number((rng::time_unit(node, t) * n as f64).floor()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timespan::TimeSpan;

    fn sample(pat: &Pattern, b: (i64, i64), e: (i64, i64)) -> f64 {
        let haps = pat.query_span(Rational::new(b.0, b.1), Rational::new(e.0, e.1));
        assert_eq!(haps.len(), 1);
        assert!(haps[0].whole.is_none());
        haps[0].value.as_number().unwrap()
    }

    #[test]
    fn signals_sample_the_midpoint() {
        let pat = saw();
        assert_eq!(sample(&pat, (0, 1), (1, 1)), 0.5);
        assert_eq!(sample(&pat, (0, 1), (1, 2)), 0.25);
        // cycle position wraps
        assert_eq!(sample(&pat, (3, 1), (7, 2)), 0.25);
    }

    #[test]
    fn signal_part_covers_query() {
        let haps = sine().query_span(Rational::new(1, 4), Rational::new(3, 4));
        assert_eq!(haps[0].part, TimeSpan::new(Rational::new(1, 4), Rational::new(3, 4)));
    }

    #[test]
    fn sine_range() {
        for i in 0..16 {
            let v = sample(&sine(), (i, 16), (i + 1, 16));
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn square_switches_halfway() {
        assert_eq!(sample(&square(), (0, 1), (1, 4)), 0.0);
        assert_eq!(sample(&square(), (3, 4), (1, 1)), 1.0);
    }

    #[test]
    fn tri_peaks_mid_cycle() {
        assert!(sample(&tri(), (7, 16), (9, 16)) > 0.9);
    }

    #[test]
    fn rand_is_reproducible_per_query() {
        let pat = rand();
        let a = sample(&pat, (0, 1), (1, 2));
        let b = sample(&pat, (0, 1), (1, 2));
        assert_eq!(a, b);
        assert!((0.0..1.0).contains(&a));
        // distinct windows sample distinct points
        let c = sample(&pat, (1, 2), (1, 1));
        assert_ne!(a, c);
    }

    #[test]
    fn irand_yields_integers_in_range() {
        let pat = irand(8);
        for i in 0..32 {
            let v = sample(&pat, (i, 4), (i + 1, 4));
            assert_eq!(v, v.floor());
            assert!((0.0..8.0).contains(&v));
        }
    }

    #[test]
    fn range_rescales_signals() {
        let pat = saw().range(100.0, 200.0);
        assert_eq!(sample(&pat, (0, 1), (1, 1)), 150.0);
    }
}
