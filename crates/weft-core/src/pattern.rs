//! The pattern type and its transformations.
//!
//! A `Pattern` is a pure function from a query [`State`] to a list of
//! [`Hap`]s, plus a `tactus` (structural step count) used by alignment
//! combinators. Patterns are immutable values; cloning shares the
//! underlying query function.

use crate::combinators::{silence, slowcat, slowcat_prime, stack};
use crate::hap::{Hap, Location};
use crate::rational::Rational;
use crate::rng;
use crate::state::State;
use crate::timespan::TimeSpan;
use crate::value::{Bias, NumOp, Value};
use std::sync::Arc;

pub(crate) type QueryFn = dyn Fn(&State) -> Vec<Hap> + Send + Sync;

pub struct Pattern {
    query: Arc<QueryFn>,
    /// Steps per cycle, when the pattern has a known structural length.
    tactus: Option<Rational>,
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Pattern {
            query: Arc::clone(&self.query),
            tactus: self.tactus,
        }
    }
}

impl Pattern {
    pub fn new<F>(query: F) -> Self
    where
        F: Fn(&State) -> Vec<Hap> + Send + Sync + 'static,
    {
        Pattern {
            query: Arc::new(query),
            tactus: None,
        }
    }

    pub fn with_tactus<F>(query: F, tactus: Option<Rational>) -> Self
    where
        F: Fn(&State) -> Vec<Hap> + Send + Sync + 'static,
    {
        Pattern {
            query: Arc::new(query),
            tactus,
        }
    }

    /// Ask the pattern for its events over the state's span.
    ///
    /// Haps come back with `part` inside the query span, `part` inside
    /// `whole` where a whole exists, and in a deterministic order; two
    /// queries with equal spans return equal lists.
    pub fn query(&self, state: &State) -> Vec<Hap> {
        (self.query)(state)
    }

    pub fn query_span(&self, begin: Rational, end: Rational) -> Vec<Hap> {
        self.query(&State::new(TimeSpan::new(begin, end)))
    }

    pub fn first_cycle(&self) -> Vec<Hap> {
        self.query_span(Rational::zero(), Rational::one())
    }

    pub fn first_cycle_values(&self) -> Vec<Value> {
        self.first_cycle().into_iter().map(|h| h.value).collect()
    }

    pub fn tactus(&self) -> Option<Rational> {
        self.tactus
    }

    pub fn set_tactus(mut self, tactus: Option<Rational>) -> Self {
        self.tactus = tactus;
        self
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// Map over every hap's value.
    pub fn with_value<F>(self, f: F) -> Pattern
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        let query = self.query;
        Pattern {
            query: Arc::new(move |state| {
                query(state)
                    .into_iter()
                    .map(|hap| hap.with_value(|v| f(v)))
                    .collect()
            }),
            tactus: self.tactus,
        }
    }

    /// Functor map; alias for [`Pattern::with_value`].
    pub fn fmap<F>(self, f: F) -> Pattern
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.with_value(f)
    }

    /// Transform the query span before querying.
    pub fn with_query_span<F>(self, f: F) -> Pattern
    where
        F: Fn(TimeSpan) -> TimeSpan + Send + Sync + 'static,
    {
        let query = self.query;
        Pattern {
            query: Arc::new(move |state| query(&state.with_span(|span| f(span)))),
            tactus: self.tactus,
        }
    }

    /// Transform both endpoints of the query span.
    pub fn with_query_time<F>(self, f: F) -> Pattern
    where
        F: Fn(Rational) -> Rational + Send + Sync + 'static,
    {
        self.with_query_span(move |span| span.with_time(&f))
    }

    /// Transform the spans of returned haps.
    pub fn with_hap_span<F>(self, f: F) -> Pattern
    where
        F: Fn(TimeSpan) -> TimeSpan + Send + Sync + 'static,
    {
        let query = self.query;
        Pattern {
            query: Arc::new(move |state| {
                query(state)
                    .into_iter()
                    .map(|hap| hap.with_span(&f))
                    .collect()
            }),
            tactus: self.tactus,
        }
    }

    /// Transform both endpoints of returned hap spans.
    pub fn with_hap_time<F>(self, f: F) -> Pattern
    where
        F: Fn(Rational) -> Rational + Send + Sync + 'static,
    {
        self.with_hap_span(move |span| span.with_time(&f))
    }

    pub fn with_hap<F>(self, f: F) -> Pattern
    where
        F: Fn(Hap) -> Hap + Send + Sync + 'static,
    {
        let query = self.query;
        Pattern {
            query: Arc::new(move |state| query(state).into_iter().map(&f).collect()),
            tactus: self.tactus,
        }
    }

    pub fn with_haps<F>(self, f: F) -> Pattern
    where
        F: Fn(Vec<Hap>) -> Vec<Hap> + Send + Sync + 'static,
    {
        let query = self.query;
        Pattern {
            query: Arc::new(move |state| f(query(state))),
            tactus: self.tactus,
        }
    }

    pub fn filter_haps<F>(self, pred: F) -> Pattern
    where
        F: Fn(&Hap) -> bool + Send + Sync + 'static,
    {
        let query = self.query;
        Pattern {
            query: Arc::new(move |state| {
                query(state).into_iter().filter(|h| pred(h)).collect()
            }),
            tactus: self.tactus,
        }
    }

    pub fn filter_values<F>(self, pred: F) -> Pattern
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.filter_haps(move |hap| pred(&hap.value))
    }

    /// Keep only haps whose onset falls inside the query.
    pub fn onsets_only(self) -> Pattern {
        self.filter_haps(|hap| hap.has_onset())
    }

    /// Keep only discrete haps (drops analog signal samples).
    pub fn discrete_only(self) -> Pattern {
        self.filter_haps(|hap| hap.whole.is_some())
    }

    /// Split incoming queries at cycle boundaries. Combinators whose
    /// behavior depends on the cycle index wrap themselves in this so a
    /// query spanning several cycles stays well defined.
    pub fn split_queries(self) -> Pattern {
        let query = self.query;
        Pattern {
            query: Arc::new(move |state| {
                state
                    .span
                    .span_cycles()
                    .into_iter()
                    .flat_map(|subspan| query(&state.set_span(subspan)))
                    .collect()
            }),
            tactus: self.tactus,
        }
    }

    /// Tag every produced hap with a source location.
    pub fn with_location(self, location: Location) -> Pattern {
        self.with_hap(move |hap| hap.push_location(location))
    }

    /// Keep only haps whose event begins at a cycle position accepted by
    /// `test`.
    fn play_when<F>(self, test: F) -> Pattern
    where
        F: Fn(Rational) -> bool + Send + Sync + 'static,
    {
        self.filter_haps(move |hap| test(hap.whole_or_part().begin))
    }

    // ------------------------------------------------------------------
    // Applicative combination
    // ------------------------------------------------------------------

    /// Combine with another pattern, taking structure from `self`. For
    /// each of self's haps the other pattern is sampled over the hap's
    /// whole; values combine through `combine`, which may reject a pair
    /// (the hap is dropped, not the pattern).
    pub fn app_left<F>(self, other: Pattern, combine: F) -> Pattern
    where
        F: Fn(&Value, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        let query = self.query;
        let tactus = self.tactus;
        Pattern {
            query: Arc::new(move |state| {
                let mut out = Vec::new();
                for hl in query(state) {
                    let sampled = other.query(&state.set_span(hl.whole_or_part()));
                    for hr in sampled {
                        if let Some(part) = hl.part.intersection(&hr.part) {
                            if let Some(value) = combine(&hl.value, &hr.value) {
                                let context = hl.combine_context(&hr);
                                out.push(Hap::with_context(hl.whole, part, value, context));
                            }
                        }
                    }
                }
                out
            }),
            tactus,
        }
    }

    /// Combine with another pattern, taking structure from `other`.
    pub fn app_right<F>(self, other: Pattern, combine: F) -> Pattern
    where
        F: Fn(&Value, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        let left = self;
        let tactus = other.tactus;
        other
            .app_left(left, move |b, a| combine(a, b))
            .set_tactus(tactus)
    }

    /// Combine with another pattern over the intersection of both
    /// structures: both sides are queried over the same span and every
    /// overlapping pair of haps yields one combined hap.
    pub fn app_both<F>(self, other: Pattern, combine: F) -> Pattern
    where
        F: Fn(&Value, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        let query = self.query;
        let tactus = self.tactus.or(other.tactus);
        Pattern {
            query: Arc::new(move |state| {
                let ours = query(state);
                let theirs = other.query(state);
                let mut out = Vec::new();
                for hl in &ours {
                    for hr in &theirs {
                        let whole = match (hl.whole, hr.whole) {
                            (Some(a), Some(b)) => match a.intersection(&b) {
                                Some(w) => Some(w),
                                None => continue,
                            },
                            _ => None,
                        };
                        let part = match hl.part.intersection(&hr.part) {
                            Some(p) => p,
                            None => continue,
                        };
                        if let Some(value) = combine(&hl.value, &hr.value) {
                            let context = hl.combine_context(hr);
                            out.push(Hap::with_context(whole, part, value, context));
                        }
                    }
                }
                out
            }),
            tactus,
        }
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Speed the pattern up by a factor.
    ///
    /// Panics if the factor is zero; a degenerate tempo has no meaning.
    /// The notation and language layers validate factors before calling,
    /// turning bad user input into diagnostics instead.
    pub fn fast(self, factor: Rational) -> Pattern {
        assert!(!factor.is_zero(), "pattern speed factor must be non-zero");
        self.with_query_time(move |t| t * factor)
            .with_hap_time(move |t| t / factor)
    }

    /// Slow the pattern down by a factor. Panics if the factor is zero.
    pub fn slow(self, factor: Rational) -> Pattern {
        assert!(!factor.is_zero(), "pattern speed factor must be non-zero");
        self.fast(factor.recip())
    }

    /// Shift earlier in time by `offset` cycles.
    pub fn early(self, offset: Rational) -> Pattern {
        self.with_query_time(move |t| t + offset)
            .with_hap_time(move |t| t - offset)
    }

    /// Shift later in time by `offset` cycles.
    pub fn late(self, offset: Rational) -> Pattern {
        self.early(-offset)
    }

    /// Reverse within each cycle. Reflection happens around the queried
    /// cycle, so `rev` never leaks events across cycle boundaries.
    pub fn rev(self) -> Pattern {
        let query = self.query;
        let tactus = self.tactus;
        Pattern {
            query: Arc::new(move |state| {
                let span = state.span;
                let cycle = span.begin.sam();
                let next = span.begin.next_sam();
                let reflect = move |ts: TimeSpan| {
                    TimeSpan::new(cycle + (next - ts.end), cycle + (next - ts.begin))
                };

                query(&state.set_span(reflect(span)))
                    .into_iter()
                    .map(|hap| {
                        let part = reflect(hap.part);
                        let whole = hap.whole.map(reflect);
                        Hap::with_context(whole, part, hap.value, hap.context)
                    })
                    .collect()
            }),
            tactus,
        }
        .split_queries()
    }

    /// Replace each discrete hap by `n` copies subdividing its whole.
    /// Analog haps pass through untouched.
    pub fn ply(self, n: i64) -> Pattern {
        assert!(n > 0, "ply count must be positive");
        let query = self.query;
        let tactus = self.tactus.map(|t| t * Rational::from_integer(n));
        Pattern {
            query: Arc::new(move |state| {
                let mut out = Vec::new();
                for hap in query(state) {
                    let whole = match hap.whole {
                        None => {
                            out.push(hap);
                            continue;
                        }
                        Some(w) => w,
                    };
                    let step = whole.duration() / Rational::from_integer(n);
                    for i in 0..n {
                        let begin = whole.begin + step * Rational::from_integer(i);
                        let sub = TimeSpan::new(begin, begin + step);
                        if let Some(part) = sub.intersection(&hap.part) {
                            out.push(Hap::with_context(
                                Some(sub),
                                part,
                                hap.value.clone(),
                                hap.context.clone(),
                            ));
                        }
                    }
                }
                out
            }),
            tactus,
        }
    }

    /// Rotate the cycle forward by `k/n` on cycle `k`.
    pub fn iter(self, n: i64) -> Pattern {
        assert!(n > 0, "iter count must be positive");
        let shifted = (0..n)
            .map(|i| self.clone().early(Rational::new(i, n)))
            .collect();
        slowcat_prime(shifted)
    }

    /// Like [`Pattern::iter`], rotating backwards.
    pub fn iter_back(self, n: i64) -> Pattern {
        assert!(n > 0, "iter count must be positive");
        let shifted = (0..n)
            .map(|i| self.clone().late(Rational::new(i, n)))
            .collect();
        slowcat_prime(shifted)
    }

    /// Like [`Pattern::fast`], but the sped-up cycle plays once and the
    /// rest of each cycle stays empty instead of repeating.
    pub fn fast_gap(self, factor: Rational) -> Pattern {
        assert!(!factor.is_zero(), "pattern speed factor must be non-zero");
        let query = self.query;
        let tactus = self.tactus;
        Pattern {
            query: Arc::new(move |state| {
                let span = state.span;
                let sam = span.begin.sam();
                let cycle_end = sam + Rational::one();
                let munge = |t: Rational| (sam + (t - sam) * factor).min(cycle_end);
                let unmunge = move |t: Rational| sam + (t - sam) / factor;

                let qb = munge(span.begin);
                let qe = munge(span.end);
                if qb >= cycle_end {
                    return Vec::new();
                }

                query(&state.set_span(TimeSpan::new(qb, qe)))
                    .into_iter()
                    .map(|hap| hap.with_span(|s| s.with_time(unmunge)))
                    .collect()
            }),
            tactus,
        }
        .split_queries()
    }

    /// Squeeze the whole pattern into the window `[begin, end)` of each
    /// cycle; outside the window there is silence.
    pub fn compress(self, begin: Rational, end: Rational) -> Pattern {
        let zero = Rational::zero();
        let one = Rational::one();
        if begin > end || begin < zero || end > one || begin == end {
            return silence();
        }
        let duration = end - begin;
        self.fast_gap(duration.recip()).late(begin)
    }

    /// Play only the `[begin, end)` portion of each cycle, stretched to
    /// fill the whole cycle.
    pub fn zoom(self, begin: Rational, end: Rational) -> Pattern {
        if begin >= end {
            return silence();
        }
        let duration = end - begin;
        self.with_query_span(move |span| {
            span.with_cycle(|t| t * duration + begin)
        })
        .with_hap_span(move |span| {
            let sam = span.begin.sam();
            span.with_time(|t| sam + (t - sam - begin) / duration)
        })
        .split_queries()
    }

    /// Speed up, transform, slow back down.
    pub fn inside<F>(self, factor: Rational, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        f(self.fast(factor)).slow(factor)
    }

    /// Slow down, transform, speed back up.
    pub fn outside<F>(self, factor: Rational, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        f(self.slow(factor)).fast(factor)
    }

    /// Alternate the pattern with its reverse, one cycle each.
    pub fn palindrome(self) -> Pattern {
        slowcat(vec![self.clone(), self.rev()])
    }

    /// Hold each source cycle for `n` cycles before advancing.
    pub fn repeat_cycles(self, n: i64) -> Pattern {
        assert!(n > 0, "repeat count must be positive");
        if n == 1 {
            return self;
        }
        let n_frac = Rational::from_integer(n);
        let query = self.query;
        let tactus = self.tactus;
        Pattern {
            query: Arc::new(move |state| {
                let cycle = state.span.begin.sam();
                let source_cycle = (cycle / n_frac).floor();
                let delta = cycle - source_cycle;

                query(&state.with_span(|span| span.with_time(|t| t - delta)))
                    .into_iter()
                    .map(|hap| hap.with_span(|span| span.with_time(|t| t + delta)))
                    .collect()
            }),
            tactus,
        }
        .split_queries()
    }

    /// Repeat the first `amount` of each cycle for the whole cycle.
    pub fn linger(self, amount: Rational) -> Pattern {
        if amount.is_zero() {
            return silence();
        }
        self.zoom(Rational::zero(), amount).slow(amount)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Adopt the event structure of `structure`: wherever it yields a
    /// truthy hap, emit this pattern's value sampled over that hap's
    /// whole. The inverse is [`Pattern::mask`].
    pub fn struct_(self, structure: Pattern) -> Pattern {
        let values = self;
        let tactus = structure.tactus;
        Pattern {
            query: Arc::new(move |state| {
                let mut out = Vec::new();
                for sh in structure.query(state) {
                    if !sh.value.is_truthy() {
                        continue;
                    }
                    let sampled = values.query(&state.set_span(sh.whole_or_part()));
                    for vh in sampled {
                        if let Some(part) = sh.part.intersection(&vh.part) {
                            let context = sh.combine_context(&vh);
                            out.push(Hap::with_context(sh.whole, part, vh.value.clone(), context));
                        }
                    }
                }
                out
            }),
            tactus,
        }
    }

    /// Keep this pattern's own structure, silenced wherever `structure`
    /// is not truthy. Parts are clipped to the truthy regions.
    pub fn mask(self, structure: Pattern) -> Pattern {
        let query = self.query;
        let tactus = self.tactus;
        Pattern {
            query: Arc::new(move |state| {
                let gates: Vec<Hap> = structure
                    .query(state)
                    .into_iter()
                    .filter(|h| h.value.is_truthy())
                    .collect();
                let mut out = Vec::new();
                for vh in query(state) {
                    for gate in &gates {
                        if let Some(part) = vh.part.intersection(&gate.part) {
                            out.push(Hap::with_context(
                                vh.whole,
                                part,
                                vh.value.clone(),
                                vh.combine_context(gate),
                            ));
                        }
                    }
                }
                out
            }),
            tactus,
        }
    }

    /// Stack the original with a transformed copy shifted `offset` later.
    pub fn off<F>(self, offset: Rational, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        let shifted = f(self.clone()).late(offset);
        stack(vec![self, shifted])
    }

    /// Apply `f` on every `n`th cycle, starting with cycle 0.
    pub fn every<F>(self, n: i64, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        assert!(n > 0, "every period must be positive");
        let transformed = f(self.clone());
        let mut cycles = vec![transformed];
        cycles.extend(std::iter::repeat(self).take((n - 1) as usize));
        slowcat_prime(cycles)
    }

    /// Apply `f` on every `n`th cycle, starting with the last of each
    /// group instead of the first.
    pub fn last_of<F>(self, n: i64, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        assert!(n > 0, "every period must be positive");
        let transformed = f(self.clone());
        let mut cycles: Vec<Pattern> =
            std::iter::repeat(self).take((n - 1) as usize).collect();
        cycles.push(transformed);
        slowcat_prime(cycles)
    }

    /// Apply `f` inside the cycle window `[begin, end)` only.
    pub fn within<F>(self, begin: Rational, end: Rational, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        let inside = move |t: Rational| {
            let pos = t.cycle_pos();
            pos >= begin && pos < end
        };
        stack(vec![
            f(self.clone()).play_when(inside),
            self.play_when(move |t| !inside(t)),
        ])
    }

    /// Split the cycle into `n` chunks and apply `f` to one chunk per
    /// cycle, the chosen chunk advancing each cycle.
    pub fn chunk<F>(self, n: i64, f: F) -> Pattern
    where
        F: Fn(Pattern) -> Pattern,
    {
        assert!(n > 0, "chunk count must be positive");
        let parts = (0..n)
            .map(|i| {
                self.clone()
                    .within(Rational::new(i, n), Rational::new(i + 1, n), &f)
            })
            .collect();
        slowcat(parts)
    }

    /// Choose between the original and a transformed copy per cycle.
    pub fn when_cycle<T, F>(self, test: T, f: F) -> Pattern
    where
        T: Fn(i64) -> bool + Send + Sync + 'static,
        F: FnOnce(Pattern) -> Pattern,
    {
        let plain = self.clone();
        let transformed = f(self);
        Pattern::new(move |state| {
            if test(state.span.begin.cycle_index()) {
                transformed.query(state)
            } else {
                plain.query(state)
            }
        })
        .split_queries()
    }

    /// Layer a transformed copy on top of the original.
    pub fn superimpose<F>(self, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        stack(vec![self.clone(), f(self)])
    }

    /// Stack several transformations of the same pattern.
    pub fn layer<F>(self, fs: Vec<F>) -> Pattern
    where
        F: Fn(Pattern) -> Pattern,
    {
        stack(fs.into_iter().map(|f| f(self.clone())).collect())
    }

    // ------------------------------------------------------------------
    // Randomness
    // ------------------------------------------------------------------

    /// Randomly drop events with probability `prob`, decided per event
    /// by hashing its onset through the node's stream. Stable across
    /// queries: the same event makes the same coin flip forever.
    pub fn degrade_by(self, prob: f64, node: u64) -> Pattern {
        self.filter_haps(move |hap| {
            rng::time_unit(node, hap.whole_or_part().begin) >= prob
        })
    }

    /// Drop roughly half the events.
    pub fn degrade(self) -> Pattern {
        self.degrade_by(0.5, rng::next_node_id())
    }

    /// Keep only the events `degrade_by` would drop.
    pub fn undegrade_by(self, prob: f64, node: u64) -> Pattern {
        self.filter_haps(move |hap| {
            rng::time_unit(node, hap.whole_or_part().begin) < prob
        })
    }

    /// Apply `f` to a random `prob` share of events, leaving the rest.
    pub fn sometimes_by<F>(self, prob: f64, node: u64, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        let kept = self.clone().degrade_by(prob, node);
        let changed = f(self.undegrade_by(prob, node));
        stack(vec![kept, changed])
    }

    /// `sometimes_by` at 50%.
    pub fn sometimes<F>(self, f: F) -> Pattern
    where
        F: FnOnce(Pattern) -> Pattern,
    {
        self.sometimes_by(0.5, rng::next_node_id(), f)
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Overwrite every value.
    pub fn set(self, value: Value) -> Pattern {
        self.with_value(move |_| value.clone())
    }

    fn numeric(self, op: NumOp, other: Pattern) -> Pattern {
        self.app_left(other, move |a, b| a.numeric_op(op, b).ok())
    }

    /// Numeric addition, broadcast over maps; structure from the left.
    /// Haps whose values cannot combine are dropped.
    pub fn add(self, other: Pattern) -> Pattern {
        self.numeric(NumOp::Add, other)
    }

    pub fn sub(self, other: Pattern) -> Pattern {
        self.numeric(NumOp::Sub, other)
    }

    pub fn mul(self, other: Pattern) -> Pattern {
        self.numeric(NumOp::Mul, other)
    }

    pub fn div(self, other: Pattern) -> Pattern {
        self.numeric(NumOp::Div, other)
    }

    /// Merge values as maps over intersecting haps; on key clashes this
    /// pattern wins.
    pub fn union_left(self, other: Pattern) -> Pattern {
        self.app_both(other, |a, b| Some(a.union(b, Bias::Left)))
    }

    /// Merge values as maps over intersecting haps; the other pattern
    /// wins key clashes. This is the `#` of the notation tradition.
    pub fn union_right(self, other: Pattern) -> Pattern {
        self.app_both(other, |a, b| Some(a.union(b, Bias::Right)))
    }

    /// Rescale numeric values from [0, 1] to [min, max]; other value
    /// kinds pass through.
    pub fn range(self, min: f64, max: f64) -> Pattern {
        self.with_value(move |v| match v {
            Value::Number(x) => Value::Number(x * (max - min) + min),
            other => other,
        })
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("tactus", &self.tactus)
            .finish_non_exhaustive()
    }
}
