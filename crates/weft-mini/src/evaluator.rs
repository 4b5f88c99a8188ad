//! Lowering the mini-notation syntax tree to patterns.

use crate::ast::*;
use crate::error::{MiniError, Result};
use crate::parser::parse;
use weft_core::{
    choose_weighted, euclid, fastcat, polymeter, pure, silence, slowcat, stack, timecat, Location,
    Pattern, Rational, Value,
};

/// Lower a parsed expression to a pattern. Each atom tags its haps with
/// the source span it came from.
pub fn lower(node: &Node) -> Result<Pattern> {
    match &node.kind {
        NodeKind::Rest => Ok(silence()),
        NodeKind::Number(n) => {
            Ok(pure(Value::Number(*n)).with_location(location(node)))
        }
        NodeKind::Name(s) => {
            Ok(pure(Value::String(s.clone())).with_location(location(node)))
        }
        NodeKind::Step(step) => lower_step(step, node),
        NodeKind::Group(group) => lower_group(group),
    }
}

/// Parse and lower in one go. This is what hosts register as the
/// string reifier: any bare string in the surface language goes
/// through here.
pub fn pattern(source: &str) -> Result<Pattern> {
    lower(&parse(source)?)
}

fn location(node: &Node) -> Location {
    Location::new(node.span.start, node.span.end)
}

fn lower_group(group: &GroupNode) -> Result<Pattern> {
    if group.children.is_empty() {
        return Ok(silence());
    }

    match group.shape {
        GroupShape::Cat => {
            let mut weighted: Vec<(Rational, Pattern)> = Vec::new();
            let mut uniform = true;
            for child in &group.children {
                let (weight, replicate) = step_shape(child);
                if weight != 1.0 {
                    uniform = false;
                }
                let pat = lower(child)?;
                for _ in 0..replicate {
                    weighted.push((Rational::approximate(weight), pat.clone()));
                }
            }
            if weighted.len() == 1 {
                return Ok(weighted.into_iter().next().expect("len checked").1);
            }
            if uniform {
                Ok(fastcat(weighted.into_iter().map(|(_, p)| p).collect()))
            } else {
                Ok(timecat(weighted))
            }
        }
        GroupShape::Stack => {
            let rows: Result<Vec<Pattern>> = group.children.iter().map(lower).collect();
            Ok(stack(rows?))
        }
        GroupShape::Choice => {
            let seed = group.choice_seed.unwrap_or(0);
            let mut weighted = Vec::new();
            for child in &group.children {
                let weight = row_weight(child);
                weighted.push((Rational::approximate(weight), lower(child)?));
            }
            Ok(choose_weighted(weighted, seed))
        }
        GroupShape::Polymeter => {
            let rows: Result<Vec<Pattern>> = group.children.iter().map(lower).collect();
            let rows = rows?;

            let steps = match &group.steps {
                Some(steps_node) => {
                    let n = extract_number(steps_node)?;
                    if n <= 0.0 || n.fract() != 0.0 {
                        return Err(MiniError::modifier(
                            "polymeter steps must be a positive integer",
                            steps_node.span,
                        ));
                    }
                    Rational::from_integer(n as i64)
                }
                // Default meter: the longest row wins.
                None => {
                    let longest = group
                        .children
                        .iter()
                        .map(row_length)
                        .fold(Rational::zero(), Rational::max);
                    if longest.is_zero() {
                        return Ok(silence());
                    }
                    longest
                }
            };
            Ok(polymeter(rows, Some(steps)))
        }
        GroupShape::Alternate => {
            let mut turns = Vec::new();
            for child in &group.children {
                let (_, replicate) = step_shape(child);
                let pat = lower(child)?;
                for _ in 0..replicate {
                    turns.push(pat.clone());
                }
            }
            Ok(slowcat(turns))
        }
    }
}

fn lower_step(step: &StepNode, node: &Node) -> Result<Pattern> {
    let mut pat = lower(&step.source)?;

    for modifier in &step.modifiers {
        pat = apply_modifier(pat, modifier, node)?;
    }
    Ok(pat)
}

fn apply_modifier(pat: Pattern, modifier: &Modifier, node: &Node) -> Result<Pattern> {
    match modifier {
        Modifier::Fast(amount) => {
            let factor = speed_factor(amount)?;
            Ok(pat.fast(factor))
        }
        Modifier::Slow(amount) => {
            let factor = speed_factor(amount)?;
            Ok(pat.slow(factor))
        }
        Modifier::Euclid {
            pulses,
            steps,
            rotation,
        } => {
            let k = extract_number(pulses)?;
            let n = extract_number(steps)?;
            if k < 0.0 || k.fract() != 0.0 || n <= 0.0 || n.fract() != 0.0 {
                return Err(MiniError::modifier(
                    "euclid expects whole pulse and step counts",
                    node.span,
                ));
            }
            let rot = match rotation {
                Some(r) => {
                    let r_val = extract_number(r)?;
                    if r_val.fract() != 0.0 {
                        return Err(MiniError::modifier(
                            "euclid rotation must be a whole number",
                            r.span,
                        ));
                    }
                    (r_val as i64).rem_euclid(n as i64) as usize
                }
                None => 0,
            };
            Ok(pat.struct_(euclid(k as usize, n as usize, rot)))
        }
        Modifier::Degrade { amount, seed } => Ok(pat.degrade_by(*amount, *seed)),
        Modifier::Select(SelectArg::Index(n)) => {
            let n = *n;
            Ok(pat.with_value(move |v| v.with_entry("n", Value::Number(n))))
        }
        Modifier::Select(SelectArg::Name(name)) => {
            let name = name.clone();
            Ok(pat.with_value(move |v| v.with_entry("s", Value::String(name.clone()))))
        }
    }
}

fn speed_factor(amount: &Node) -> Result<Rational> {
    let n = extract_number(amount)?;
    if n == 0.0 {
        return Err(MiniError::modifier(
            "speed factor must not be zero",
            amount.span,
        ));
    }
    Ok(Rational::approximate(n))
}

/// Weight and replicate count of a sequence child.
fn step_shape(node: &Node) -> (f64, usize) {
    match &node.kind {
        NodeKind::Step(step) => (step.weight, step.replicate.max(1)),
        _ => (1.0, 1),
    }
}

/// The weight a row contributes to a weighted choice: a single-step row
/// uses its step's `@` weight.
fn row_weight(node: &Node) -> f64 {
    match &node.kind {
        NodeKind::Step(step) => step.weight,
        NodeKind::Group(group) if group.children.len() == 1 => row_weight(&group.children[0]),
        _ => 1.0,
    }
}

/// Structural length of a row: the sum of its steps' weights (a
/// replicated step counts once per copy).
fn row_length(node: &Node) -> Rational {
    match &node.kind {
        NodeKind::Group(group) if group.shape == GroupShape::Cat => group
            .children
            .iter()
            .map(|c| {
                let (weight, replicate) = step_shape(c);
                Rational::approximate(weight) * Rational::from_integer(replicate as i64)
            })
            .fold(Rational::zero(), |a, b| a + b),
        _ => Rational::one(),
    }
}

/// A constant number out of a modifier argument, looking through
/// single-step wrappers.
fn extract_number(node: &Node) -> Result<f64> {
    match &node.kind {
        NodeKind::Number(n) => Ok(*n),
        NodeKind::Step(step) if step.modifiers.is_empty() => extract_number(&step.source),
        NodeKind::Group(group) if group.children.len() == 1 => {
            extract_number(&group.children[0])
        }
        _ => Err(MiniError::modifier("expected a number here", node.span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{Hap, TimeSpan};

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(n, d)
    }

    fn first_cycle(source: &str) -> Vec<Hap> {
        pattern(source).unwrap().first_cycle()
    }

    fn strings(haps: &[Hap]) -> Vec<String> {
        haps.iter().map(|h| h.value.to_string()).collect()
    }

    #[test]
    fn single_name() {
        let haps = first_cycle("bd");
        assert_eq!(haps.len(), 1);
        assert_eq!(haps[0].value, Value::from("bd"));
    }

    #[test]
    fn atoms_carry_locations() {
        let haps = first_cycle("bd sd");
        assert_eq!(haps[0].context.locations, vec![Location::new(0, 2)]);
        assert_eq!(haps[1].context.locations, vec![Location::new(3, 5)]);
    }

    #[test]
    fn rest_is_silent() {
        assert!(first_cycle("~").is_empty());
        let haps = first_cycle("bd ~ sd");
        assert_eq!(strings(&haps), vec!["bd", "sd"]);
        assert_eq!(haps[1].part.begin, r(2, 3));
    }

    #[test]
    fn sequence_divides_cycle() {
        let haps = first_cycle("bd sd cp");
        assert_eq!(haps.len(), 3);
        assert_eq!(haps[0].part, TimeSpan::new(r(0, 1), r(1, 3)));
        assert_eq!(haps[2].part, TimeSpan::new(r(2, 3), r(1, 1)));
    }

    #[test]
    fn nested_groups_subdivide() {
        let haps = first_cycle("bd [sd cp]");
        assert_eq!(haps.len(), 3);
        assert_eq!(haps[1].part, TimeSpan::new(r(1, 2), r(3, 4)));
        assert_eq!(haps[2].part, TimeSpan::new(r(3, 4), r(1, 1)));
    }

    #[test]
    fn fast_modifier_repeats_group() {
        // The snapshot case: five haps at 0, 1/2, 5/8, 3/4, 7/8.
        let haps = first_cycle("bd [sd cp]*2");
        assert_eq!(haps.len(), 5);
        let begins: Vec<Rational> = haps.iter().map(|h| h.part.begin).collect();
        assert_eq!(begins, vec![r(0, 1), r(1, 2), r(5, 8), r(3, 4), r(7, 8)]);
        assert_eq!(strings(&haps), vec!["bd", "sd", "cp", "sd", "cp"]);
    }

    #[test]
    fn slow_modifier_stretches() {
        let pat = pattern("bd/2").unwrap();
        assert_eq!(pat.query_span(r(0, 1), r(2, 1)).len(), 1);
    }

    #[test]
    fn euclid_snapshot() {
        // bd(3,8) = tresillo: onsets at 0, 3/8, 6/8.
        let haps = first_cycle("bd(3,8)");
        assert_eq!(haps.len(), 3);
        assert_eq!(haps[0].part, TimeSpan::new(r(0, 1), r(1, 8)));
        assert_eq!(haps[1].part, TimeSpan::new(r(3, 8), r(1, 2)));
        assert_eq!(haps[2].part, TimeSpan::new(r(3, 4), r(7, 8)));
        assert!(haps.iter().all(|h| h.value == Value::from("bd")));
    }

    #[test]
    fn euclid_rotation() {
        let haps = first_cycle("bd(3,8,2)");
        assert_eq!(haps.len(), 3);
        // layout 10010010 rotated left twice: 01001010
        assert_eq!(haps[0].part.begin, r(1, 8));
    }

    #[test]
    fn replicate_expands_steps() {
        let haps = first_cycle("bd!3 sd");
        assert_eq!(strings(&haps), vec!["bd", "bd", "bd", "sd"]);
        assert_eq!(haps[0].part, TimeSpan::new(r(0, 1), r(1, 4)));
    }

    #[test]
    fn weights_stretch_steps() {
        let haps = first_cycle("bd@3 sd");
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].whole.unwrap(), TimeSpan::new(r(0, 1), r(3, 4)));
        assert_eq!(haps[1].whole.unwrap(), TimeSpan::new(r(3, 4), r(1, 1)));
    }

    #[test]
    fn stack_layers_rows() {
        let haps = first_cycle("bd sd, hh hh");
        assert_eq!(haps.len(), 4);
        assert_eq!(strings(&haps), vec!["bd", "sd", "hh", "hh"]);
    }

    #[test]
    fn alternate_steps_one_per_cycle() {
        let pat = pattern("<bd sd cp>").unwrap();
        assert_eq!(strings(&pat.query_span(r(0, 1), r(1, 1))), vec!["bd"]);
        assert_eq!(strings(&pat.query_span(r(1, 1), r(2, 1))), vec!["sd"]);
        assert_eq!(strings(&pat.query_span(r(2, 1), r(3, 1))), vec!["cp"]);
        assert_eq!(strings(&pat.query_span(r(3, 1), r(4, 1))), vec!["bd"]);
    }

    #[test]
    fn alternate_inside_sequence() {
        let pat = pattern("bd <sd cp>").unwrap();
        assert_eq!(strings(&pat.query_span(r(0, 1), r(1, 1))), vec!["bd", "sd"]);
        assert_eq!(strings(&pat.query_span(r(1, 1), r(2, 1))), vec!["bd", "cp"]);
    }

    #[test]
    fn polymeter_shares_step_grid() {
        // {bd sd, hh oh cp}: 3-step row sets the meter; the 2-step row
        // cycles through its steps at the same rate.
        let haps = first_cycle("{bd sd, hh oh cp}");
        assert_eq!(haps.len(), 6);
        assert_eq!(
            strings(&haps),
            vec!["bd", "sd", "bd", "hh", "oh", "cp"]
        );
    }

    #[test]
    fn polymeter_explicit_steps() {
        let haps = first_cycle("{bd sd}%4");
        assert_eq!(strings(&haps), vec!["bd", "sd", "bd", "sd"]);
        assert_eq!(haps[0].whole.unwrap().end, r(1, 4));
    }

    #[test]
    fn choice_is_stable_per_cycle() {
        let pat = pattern("bd | sd | cp").unwrap();
        let a = strings(&pat.query_span(r(0, 1), r(1, 1)));
        let b = strings(&pat.query_span(r(0, 1), r(1, 1)));
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert!(["bd", "sd", "cp"].contains(&a[0].as_str()));
    }

    #[test]
    fn select_index_builds_parameter_map() {
        let haps = first_cycle("bd:3");
        assert_eq!(haps.len(), 1);
        let m = haps[0].value.as_map().unwrap();
        assert_eq!(m.get("s"), Some(&Value::from("bd")));
        assert_eq!(m.get("n"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn select_name_sets_bank() {
        let haps = first_cycle("bd:kit");
        let m = haps[0].value.as_map().unwrap();
        assert_eq!(m.get("s"), Some(&Value::from("kit")));
    }

    #[test]
    fn degrade_is_deterministic() {
        let pat = pattern("hh*8?").unwrap();
        assert_eq!(pat.first_cycle(), pat.first_cycle());
        let kept = pat.query_span(r(0, 1), r(4, 1)).len();
        assert!(kept < 32, "a 50% degrade kept all {} events", kept);
    }

    #[test]
    fn zero_speed_factor_is_an_error() {
        let err = pattern("bd*0").unwrap_err();
        assert!(matches!(err, MiniError::BadModifier { .. }));
        assert!(pattern("bd/0").is_err());
    }

    #[test]
    fn bad_euclid_arguments_are_errors() {
        assert!(pattern("bd(3,0)").is_err());
        assert!(pattern("bd(x,8)").is_err());
    }

    #[test]
    fn numbers_are_numeric_values() {
        let haps = first_cycle("1 2 3");
        assert_eq!(haps[0].value, Value::Number(1.0));
        assert_eq!(haps[2].value, Value::Number(3.0));
    }
}
