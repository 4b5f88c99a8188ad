//! Pattern constructors and multi-pattern combinators.

use crate::hap::Hap;
use crate::pattern::Pattern;
use crate::rational::{self, Rational};
use crate::rng;
use crate::state::State;
use crate::timespan::TimeSpan;
use crate::value::Value;
use rand::Rng;
use std::sync::Arc;

/// One event per cycle carrying `value`, whole-cycle wholes.
pub fn pure(value: Value) -> Pattern {
    Pattern::with_tactus(
        move |state: &State| {
            state
                .span
                .span_cycles()
                .into_iter()
                .map(|subspan| {
                    let (begin, end) = subspan.begin.whole_cycle();
                    Hap::new(Some(TimeSpan::new(begin, end)), subspan, value.clone())
                })
                .collect()
        },
        Some(Rational::one()),
    )
}

/// The empty pattern.
pub fn silence() -> Pattern {
    Pattern::new(|_| Vec::new())
}

/// Silence that still counts for `steps` structural steps.
pub fn gap(steps: i64) -> Pattern {
    Pattern::with_tactus(|_| Vec::new(), Some(Rational::from_integer(steps)))
}

/// A value held forever: like `pure` but with no per-cycle onsets.
pub fn steady(value: Value) -> Pattern {
    Pattern::new(move |state: &State| vec![Hap::new(None, state.span, value.clone())])
}

/// Layer patterns; all play at once. Haps with equal onsets keep the
/// argument order.
pub fn stack(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }
    if patterns.len() == 1 {
        return patterns.into_iter().next().expect("len checked");
    }

    let tactus = combined_tactus(&patterns);
    let patterns = Arc::new(patterns);
    Pattern::with_tactus(
        move |state: &State| {
            patterns
                .iter()
                .flat_map(|pat| pat.query(state))
                .collect()
        },
        tactus,
    )
}

/// Two-pattern [`stack`].
pub fn overlay(a: Pattern, b: Pattern) -> Pattern {
    stack(vec![a, b])
}

/// Patterns take turns, one full cycle each, the sequence looping.
/// Cycle `n` plays pattern `n mod k`, shifted so each pattern proceeds
/// through its own cycles in order.
pub fn slowcat(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }
    if patterns.len() == 1 {
        return patterns.into_iter().next().expect("len checked");
    }

    let len = patterns.len() as i64;
    let tactus = combined_tactus(&patterns);
    let patterns = Arc::new(patterns);

    Pattern::with_tactus(
        move |state: &State| {
            let span = state.span;
            let cycle = span.begin.cycle_index();
            let index = cycle.rem_euclid(len) as usize;
            let pat = &patterns[index];

            // Shift so the chosen pattern sees its own consecutive
            // cycles rather than skipping len-1 cycles between turns.
            let offset = span.begin.sam()
                - Rational::from_integer(cycle.div_euclid(len));

            pat.query(&state.with_span(|s| s.with_time(|t| t - offset)))
                .into_iter()
                .map(|hap| hap.with_span(|s| s.with_time(|t| t + offset)))
                .collect()
        },
        tactus,
    )
    .split_queries()
}

/// Like [`slowcat`] but without the cycle adjustment: each pattern is
/// queried at the true cycle number. `every` and friends build on this.
pub fn slowcat_prime(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }
    let len = patterns.len() as i64;
    let patterns = Arc::new(patterns);
    Pattern::new(move |state: &State| {
        let index = state.span.begin.cycle_index().rem_euclid(len) as usize;
        patterns[index].query(state)
    })
    .split_queries()
}

/// Alias for [`slowcat`].
pub fn cat(patterns: Vec<Pattern>) -> Pattern {
    slowcat(patterns)
}

/// Pack all patterns into a single cycle, each taking an equal share.
pub fn fastcat(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }
    let len = patterns.len() as i64;
    slowcat(patterns)
        .fast(Rational::from_integer(len))
        .set_tactus(Some(Rational::from_integer(len)))
}

/// Alias for [`fastcat`].
pub fn sequence(patterns: Vec<Pattern>) -> Pattern {
    fastcat(patterns)
}

/// Like [`fastcat`] with explicit weights: each pattern occupies a share
/// of the cycle proportional to its weight.
pub fn timecat(weighted: Vec<(Rational, Pattern)>) -> Pattern {
    let total = weighted
        .iter()
        .fold(Rational::zero(), |acc, (w, _)| acc + *w);
    if total.is_zero() {
        return silence();
    }

    let mut layers = Vec::with_capacity(weighted.len());
    let mut pos = Rational::zero();
    for (weight, pat) in weighted {
        if weight.is_zero() {
            continue;
        }
        let begin = pos / total;
        let end = (pos + weight) / total;
        layers.push(pat.compress(begin, end));
        pos = pos + weight;
    }
    stack(layers).set_tactus(Some(total))
}

/// Play patterns simultaneously, rescaling each so its own step count
/// maps onto `steps` steps per cycle. With no explicit step count the
/// first pattern's tactus sets the meter.
pub fn polymeter(patterns: Vec<Pattern>, steps: Option<Rational>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }

    let target = steps
        .or_else(|| patterns.iter().find_map(|p| p.tactus()))
        .unwrap_or_else(Rational::one);
    if target.is_zero() {
        return silence();
    }

    let adjusted = patterns
        .into_iter()
        .map(|pat| {
            let own = pat.tactus().unwrap_or_else(Rational::one);
            if own.is_zero() || own == target {
                pat
            } else {
                pat.fast(target / own)
            }
        })
        .collect();
    stack(adjusted).set_tactus(Some(target))
}

/// Play patterns simultaneously with no rescaling; each keeps its own
/// step count inside the shared cycle.
pub fn polyrhythm(patterns: Vec<Pattern>) -> Pattern {
    stack(patterns)
}

/// Pick one pattern per cycle, uniformly at random. `node` fixes the
/// random stream; equal nodes replay identical choices.
pub fn choose(patterns: Vec<Pattern>, node: u64) -> Pattern {
    let weighted = patterns
        .into_iter()
        .map(|p| (Rational::one(), p))
        .collect();
    choose_weighted(weighted, node)
}

/// Pick one pattern per cycle with probability proportional to weight.
pub fn choose_weighted(weighted: Vec<(Rational, Pattern)>, node: u64) -> Pattern {
    if weighted.is_empty() {
        return silence();
    }
    if weighted.len() == 1 {
        return weighted.into_iter().next().expect("len checked").1;
    }

    let total: f64 = weighted.iter().map(|(w, _)| w.to_f64()).sum();
    let weighted = Arc::new(weighted);

    Pattern::new(move |state: &State| {
        let cycle = state.span.begin.cycle_index();
        let mut stream = rng::cycle_rng(node, cycle);

        if total <= 0.0 {
            let index = stream.gen_range(0..weighted.len());
            return weighted[index].1.query(state);
        }

        let roll = stream.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (weight, pat) in weighted.iter() {
            cumulative += weight.to_f64();
            if roll < cumulative {
                return pat.query(state);
            }
        }
        weighted.last().expect("non-empty").1.query(state)
    })
    .split_queries()
}

/// Select a pattern per selector hap: the selector's value in [0, 1)
/// indexes the list, and the chosen pattern is queried over the
/// selector hap's part.
pub fn choose_by(selector: Pattern, patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }
    let len = patterns.len();
    let patterns = Arc::new(patterns);

    Pattern::new(move |state: &State| {
        let mut out = Vec::new();
        for sel in selector.query(state) {
            let unit = sel.value.as_number().unwrap_or(0.0).clamp(0.0, 1.0);
            let mut index = (unit * len as f64) as usize;
            if index >= len {
                index = len - 1;
            }
            for hap in patterns[index].query(&state.set_span(sel.part)) {
                if let Some(part) = hap.part.intersection(&sel.part) {
                    out.push(Hap::with_context(
                        hap.whole,
                        part,
                        hap.value.clone(),
                        hap.combine_context(&sel),
                    ));
                }
            }
        }
        out
    })
}

/// LCM of the child tactus values, when any are known.
fn combined_tactus(patterns: &[Pattern]) -> Option<Rational> {
    let known: Vec<Rational> = patterns.iter().filter_map(|p| p.tactus()).collect();
    if known.is_empty() {
        None
    } else {
        rational::lcm(&known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(n, d)
    }

    fn strings(haps: &[Hap]) -> Vec<String> {
        haps.iter().map(|h| h.value.to_string()).collect()
    }

    #[test]
    fn pure_one_hap_per_cycle() {
        let haps = pure(Value::from("bd")).query_span(r(0, 1), r(2, 1));
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].whole.unwrap(), TimeSpan::from_integers(0, 1));
        assert_eq!(haps[1].whole.unwrap(), TimeSpan::from_integers(1, 2));
        assert!(haps.iter().all(|h| h.value == Value::from("bd")));
    }

    #[test]
    fn pure_clips_part_to_query() {
        let haps = pure(Value::from("x")).query_span(r(1, 2), r(5, 2));
        assert_eq!(haps.len(), 3);
        assert_eq!(haps[0].part, TimeSpan::new(r(1, 2), r(1, 1)));
        assert_eq!(haps[0].whole.unwrap(), TimeSpan::from_integers(0, 1));
        assert!(!haps[0].has_onset());
        assert!(haps[1].has_onset());
    }

    #[test]
    fn pure_zero_width_query() {
        let haps = pure(Value::from("x")).query_span(r(0, 1), r(0, 1));
        assert_eq!(haps.len(), 1);
        assert!(haps[0].part.is_empty());
    }

    #[test]
    fn silence_is_empty() {
        assert!(silence().query_span(r(0, 1), r(4, 1)).is_empty());
    }

    #[test]
    fn fastcat_divides_the_cycle() {
        let pat = fastcat(vec![
            pure(Value::from("a")),
            pure(Value::from("b")),
        ]);
        let haps = pat.first_cycle();
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].whole.unwrap(), TimeSpan::new(r(0, 1), r(1, 2)));
        assert_eq!(haps[0].part, TimeSpan::new(r(0, 1), r(1, 2)));
        assert_eq!(haps[1].whole.unwrap(), TimeSpan::new(r(1, 2), r(1, 1)));
        assert_eq!(haps[1].part, TimeSpan::new(r(1, 2), r(1, 1)));
        assert_eq!(strings(&haps), vec!["a", "b"]);
    }

    #[test]
    fn fastcat_single_pattern_is_identity() {
        let pat = fastcat(vec![pure(Value::from("a"))]);
        assert_eq!(pat.first_cycle(), pure(Value::from("a")).first_cycle());
    }

    #[test]
    fn stack_single_pattern_is_identity() {
        let pat = stack(vec![pure(Value::from("a"))]);
        assert_eq!(pat.first_cycle(), pure(Value::from("a")).first_cycle());
    }

    #[test]
    fn stack_keeps_argument_order() {
        let pat = stack(vec![
            fastcat(vec![pure(Value::from("bd")), pure(Value::from("sd"))]),
            fastcat(vec![pure(Value::from("hh")), pure(Value::from("cp"))]),
        ]);
        let haps = pat.first_cycle();
        assert_eq!(strings(&haps), vec!["bd", "sd", "hh", "cp"]);
    }

    #[test]
    fn slowcat_alternates_cycles() {
        let pat = slowcat(vec![pure(Value::from("a")), pure(Value::from("b"))]);
        assert_eq!(strings(&pat.query_span(r(0, 1), r(1, 1))), vec!["a"]);
        assert_eq!(strings(&pat.query_span(r(1, 1), r(2, 1))), vec!["b"]);
        assert_eq!(strings(&pat.query_span(r(2, 1), r(3, 1))), vec!["a"]);
        assert_eq!(strings(&pat.query_span(r(-1, 1), r(0, 1))), vec!["b"]);
    }

    #[test]
    fn nested_slowcat_advances_inner_cycles() {
        let inner = slowcat(vec![pure(Value::from("b")), pure(Value::from("c"))]);
        let outer = slowcat(vec![pure(Value::from("a")), inner]);
        assert_eq!(
            strings(&outer.clone().early(Rational::one()).first_cycle()),
            vec!["b"]
        );
        assert_eq!(
            strings(&outer.early(Rational::from_integer(3)).first_cycle()),
            vec!["c"]
        );
    }

    #[test]
    fn fastcat_of_fastcats_law() {
        // fastcat(ps).fast(k) queries each pi at slot i/k.
        let pat = fastcat(vec![
            pure(Value::from("a")),
            pure(Value::from("b")),
            pure(Value::from("c")),
        ]);
        let haps = pat.first_cycle();
        for (i, hap) in haps.iter().enumerate() {
            assert_eq!(hap.part.begin, r(i as i64, 3));
        }
    }

    #[test]
    fn timecat_honors_weights() {
        let pat = timecat(vec![
            (r(2, 1), pure(Value::from("a"))),
            (r(1, 1), pure(Value::from("b"))),
            (r(1, 1), pure(Value::from("c"))),
        ]);
        let haps = pat.first_cycle();
        assert_eq!(strings(&haps), vec!["a", "b", "c"]);
        assert_eq!(haps[0].whole.unwrap(), TimeSpan::new(r(0, 1), r(1, 2)));
        assert_eq!(haps[1].whole.unwrap(), TimeSpan::new(r(1, 2), r(3, 4)));
        assert_eq!(haps[2].whole.unwrap(), TimeSpan::new(r(3, 4), r(1, 1)));
    }

    #[test]
    fn timecat_equal_weights_is_fastcat() {
        let a = timecat(vec![
            (r(1, 1), pure(Value::from("a"))),
            (r(1, 1), pure(Value::from("b"))),
        ]);
        let b = fastcat(vec![pure(Value::from("a")), pure(Value::from("b"))]);
        let strip = |haps: Vec<Hap>| -> Vec<(Option<TimeSpan>, TimeSpan, Value)> {
            haps.into_iter().map(|h| (h.whole, h.part, h.value)).collect()
        };
        assert_eq!(strip(a.first_cycle()), strip(b.first_cycle()));
    }

    #[test]
    fn polymeter_rescales_to_target_steps() {
        // {a b c}%4 plays 4 steps of the 3-step sequence per cycle.
        let pat = polymeter(
            vec![fastcat(vec![
                pure(Value::from("a")),
                pure(Value::from("b")),
                pure(Value::from("c")),
            ])],
            Some(r(4, 1)),
        );
        let haps = pat.first_cycle();
        assert_eq!(haps.len(), 4);
        assert_eq!(strings(&haps), vec!["a", "b", "c", "a"]);
        assert_eq!(haps[0].whole.unwrap().end, r(1, 4));
    }

    #[test]
    fn polymeter_defaults_to_first_tactus() {
        let pat = polymeter(
            vec![
                fastcat(vec![pure(Value::from("a")), pure(Value::from("b"))]),
                fastcat(vec![
                    pure(Value::from("c")),
                    pure(Value::from("d")),
                    pure(Value::from("e")),
                ]),
            ],
            None,
        );
        let haps = pat.first_cycle();
        // First pattern sets 2 steps; the 3-step one is squeezed to 2.
        assert_eq!(haps.len(), 4);
        assert_eq!(strings(&haps), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn polyrhythm_keeps_native_lengths() {
        let pat = polyrhythm(vec![
            fastcat(vec![pure(Value::from("a")), pure(Value::from("b"))]),
            fastcat(vec![
                pure(Value::from("c")),
                pure(Value::from("d")),
                pure(Value::from("e")),
            ]),
        ]);
        assert_eq!(pat.first_cycle().len(), 5);
    }

    #[test]
    fn choose_is_deterministic_per_cycle() {
        let pat = choose(
            vec![
                pure(Value::from("a")),
                pure(Value::from("b")),
                pure(Value::from("c")),
            ],
            77,
        );
        let first = strings(&pat.query_span(r(0, 1), r(1, 1)));
        let again = strings(&pat.query_span(r(0, 1), r(1, 1)));
        assert_eq!(first, again);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn choose_varies_across_cycles() {
        let pat = choose(
            vec![
                pure(Value::from("a")),
                pure(Value::from("b")),
                pure(Value::from("c")),
            ],
            77,
        );
        let picks: Vec<String> = (0..24)
            .map(|c| strings(&pat.query_span(r(c, 1), r(c + 1, 1)))[0].clone())
            .collect();
        let distinct: std::collections::BTreeSet<_> = picks.iter().collect();
        assert!(distinct.len() > 1, "24 cycles should not all pick the same pattern");
    }

    #[test]
    fn choose_weighted_respects_weights() {
        let pat = choose_weighted(
            vec![
                (r(3, 1), pure(Value::from("heavy"))),
                (r(1, 1), pure(Value::from("light"))),
            ],
            5,
        );
        let mut heavy = 0;
        for c in 0..200 {
            if strings(&pat.query_span(r(c, 1), r(c + 1, 1)))[0] == "heavy" {
                heavy += 1;
            }
        }
        assert!(heavy > 120, "heavy picked {} of 200", heavy);
        assert!(heavy < 190, "heavy picked {} of 200", heavy);
    }

    #[test]
    fn choose_by_indexes_with_unit_value(){
        let selector = steady(Value::Number(0.0));
        let pat = choose_by(
            selector,
            vec![pure(Value::from("first")), pure(Value::from("second"))],
        );
        assert_eq!(strings(&pat.first_cycle()), vec!["first"]);
    }

    #[test]
    fn gap_counts_steps_silently() {
        let pat = gap(4);
        assert!(pat.first_cycle().is_empty());
        assert_eq!(pat.tactus(), Some(r(4, 1)));
    }
}
