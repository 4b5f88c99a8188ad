//! Snapshot tests for the notation: known strings and the exact events
//! they produce. These pin the public syntax; changes here are breaking.

use weft_core::{Hap, Rational, TimeSpan, Value};
use weft_mini::{format, parse, pattern};

fn r(n: i64, d: i64) -> Rational {
    Rational::new(n, d)
}

fn span(b: Rational, e: Rational) -> TimeSpan {
    TimeSpan::new(b, e)
}

/// (whole, part, value) triples of the first cycle.
fn snapshot(source: &str) -> Vec<(Option<TimeSpan>, TimeSpan, Value)> {
    pattern(source)
        .unwrap()
        .first_cycle()
        .into_iter()
        .map(|h: Hap| (h.whole, h.part, h.value))
        .collect()
}

#[test]
fn four_on_the_floor() {
    assert_eq!(
        snapshot("bd bd bd bd"),
        (0..4)
            .map(|i| {
                let s = span(r(i, 4), r(i + 1, 4));
                (Some(s), s, Value::from("bd"))
            })
            .collect::<Vec<_>>()
    );
}

#[test]
fn doubled_group() {
    // E4: "bd [sd cp]*2" → five events.
    assert_eq!(
        snapshot("bd [sd cp]*2"),
        vec![
            (
                Some(span(r(0, 1), r(1, 2))),
                span(r(0, 1), r(1, 2)),
                Value::from("bd")
            ),
            (
                Some(span(r(1, 2), r(5, 8))),
                span(r(1, 2), r(5, 8)),
                Value::from("sd")
            ),
            (
                Some(span(r(5, 8), r(3, 4))),
                span(r(5, 8), r(3, 4)),
                Value::from("cp")
            ),
            (
                Some(span(r(3, 4), r(7, 8))),
                span(r(3, 4), r(7, 8)),
                Value::from("sd")
            ),
            (
                Some(span(r(7, 8), r(1, 1))),
                span(r(7, 8), r(1, 1)),
                Value::from("cp")
            ),
        ]
    );
}

#[test]
fn tresillo() {
    // E5: "bd(3,8)" → onsets on the 10010010 grid.
    assert_eq!(
        snapshot("bd(3,8)"),
        vec![
            (
                Some(span(r(0, 1), r(1, 8))),
                span(r(0, 1), r(1, 8)),
                Value::from("bd")
            ),
            (
                Some(span(r(3, 8), r(4, 8))),
                span(r(3, 8), r(4, 8)),
                Value::from("bd")
            ),
            (
                Some(span(r(6, 8), r(7, 8))),
                span(r(6, 8), r(7, 8)),
                Value::from("bd")
            ),
        ]
    );
}

#[test]
fn rests_drop_out() {
    assert_eq!(
        snapshot("bd ~ sd ~"),
        vec![
            (
                Some(span(r(0, 1), r(1, 4))),
                span(r(0, 1), r(1, 4)),
                Value::from("bd")
            ),
            (
                Some(span(r(1, 2), r(3, 4))),
                span(r(1, 2), r(3, 4)),
                Value::from("sd")
            ),
        ]
    );
}

#[test]
fn elongation_and_replication() {
    assert_eq!(
        snapshot("bd@2 sd"),
        vec![
            (
                Some(span(r(0, 1), r(2, 3))),
                span(r(0, 1), r(2, 3)),
                Value::from("bd")
            ),
            (
                Some(span(r(2, 3), r(1, 1))),
                span(r(2, 3), r(1, 1)),
                Value::from("sd")
            ),
        ]
    );
    assert_eq!(snapshot("bd!2 sd").len(), 3);
}

#[test]
fn layered_rows() {
    let haps = snapshot("bd sd, hh hh hh");
    assert_eq!(haps.len(), 5);
    assert_eq!(haps[0].2, Value::from("bd"));
    assert_eq!(haps[2].2, Value::from("hh"));
    assert_eq!(haps[2].1, span(r(0, 1), r(1, 3)));
}

#[test]
fn alternation_across_cycles() {
    let pat = pattern("bd <sd cp>(3,8)").unwrap();
    let cycle0 = pat.query_span(r(0, 1), r(1, 1));
    let cycle1 = pat.query_span(r(1, 1), r(2, 1));
    assert_eq!(cycle0.len(), 4); // bd + 3 euclid slots
    assert!(cycle0.iter().any(|h| h.value == Value::from("sd")));
    assert!(cycle1.iter().any(|h| h.value == Value::from("cp")));
}

#[test]
fn polymeter_grids() {
    let haps = snapshot("{bd sd cp}%4");
    assert_eq!(haps.len(), 4);
    assert_eq!(haps[3].2, Value::from("bd"));
    assert_eq!(haps[3].1, span(r(3, 4), r(1, 1)));
}

#[test]
fn sample_selection() {
    let haps = snapshot("bd:3 sd");
    let map = match &haps[0].2 {
        Value::Map(m) => m,
        other => panic!("expected a parameter map, got {}", other),
    };
    assert_eq!(map.get("s"), Some(&Value::from("bd")));
    assert_eq!(map.get("n"), Some(&Value::Number(3.0)));
}

#[test]
fn whitespace_and_comments_are_invisible() {
    let tight = "bd [sd cp]*2";
    let airy = "  bd\n  [ sd   cp ]*2  // comment\n";
    assert_eq!(snapshot(tight), snapshot(airy));
    // ASTs match after formatting normalizes spans away.
    assert_eq!(
        format(&parse(tight).unwrap()),
        format(&parse(airy).unwrap())
    );
}

#[test]
fn format_round_trips_the_corpus() {
    for source in [
        "bd sd cp",
        "bd [sd cp]*2",
        "bd(3,8)",
        "bd(3,8,2)",
        "{bd sd, hh oh cp}%4",
        "<bd sd> hh*2",
        "bd@3 sd!2 cp?",
        "bd:3 | sd",
        "bd ~ sd ~",
    ] {
        let printed = format(&parse(source).unwrap());
        let reprinted = format(&parse(&printed).unwrap());
        assert_eq!(printed, reprinted, "round-trip changed {}", source);
    }
}

#[test]
fn parse_errors_do_not_panic() {
    for bad in [
        "", "[", "]", "bd*", "bd(3", "bd(3,)", "{bd", "<", "bd@", "bd??", "bd:",
        "bd | | sd", "*2", "bd((", "%4",
    ] {
        assert!(pattern(bad).is_err(), "{:?} should fail to parse", bad);
    }
}

#[test]
fn deterministic_choice_sequences() {
    let pat = pattern("bd | sd | cp | hh").unwrap();
    let picks: Vec<String> = (0..16)
        .map(|c| {
            let haps = pat.query_span(r(c, 1), r(c + 1, 1));
            haps[0].value.to_string()
        })
        .collect();
    let again: Vec<String> = (0..16)
        .map(|c| {
            let haps = pat.query_span(r(c, 1), r(c + 1, 1));
            haps[0].value.to_string()
        })
        .collect();
    assert_eq!(picks, again);
    let distinct: std::collections::BTreeSet<_> = picks.iter().collect();
    assert!(distinct.len() > 1);
}
