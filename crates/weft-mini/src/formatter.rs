//! Rendering a syntax tree back to canonical mini notation.

use crate::ast::*;

/// Render a node as source text. Parsing the output yields the same
/// tree up to span information.
pub fn format(node: &Node) -> String {
    render(node, true)
}

fn render(node: &Node, top_level: bool) -> String {
    match &node.kind {
        NodeKind::Rest => "~".to_string(),
        NodeKind::Number(n) => number(*n),
        NodeKind::Name(s) => s.clone(),
        NodeKind::Step(step) => render_step(step),
        NodeKind::Group(group) => render_group(group, top_level),
    }
}

fn render_group(group: &GroupNode, top_level: bool) -> String {
    match group.shape {
        GroupShape::Cat => {
            let body = join(&group.children, " ");
            if top_level {
                body
            } else {
                format!("[{}]", body)
            }
        }
        GroupShape::Stack => {
            let body = join(&group.children, ", ");
            if top_level {
                body
            } else {
                format!("[{}]", body)
            }
        }
        GroupShape::Choice => {
            let body = join(&group.children, " | ");
            if top_level {
                body
            } else {
                format!("[{}]", body)
            }
        }
        GroupShape::Polymeter => {
            let body = join(&group.children, ", ");
            match &group.steps {
                Some(steps) => format!("{{{}}}%{}", body, render(steps, false)),
                None => format!("{{{}}}", body),
            }
        }
        GroupShape::Alternate => format!("<{}>", join(&group.children, " ")),
    }
}

fn join(children: &[Node], separator: &str) -> String {
    children
        .iter()
        .map(|c| render(c, true))
        .collect::<Vec<_>>()
        .join(separator)
}

fn render_step(step: &StepNode) -> String {
    let mut out = render(&step.source, false);

    for modifier in &step.modifiers {
        match modifier {
            Modifier::Fast(amount) => {
                out.push('*');
                out.push_str(&render(amount, false));
            }
            Modifier::Slow(amount) => {
                out.push('/');
                out.push_str(&render(amount, false));
            }
            Modifier::Euclid {
                pulses,
                steps,
                rotation,
            } => {
                out.push('(');
                out.push_str(&render(pulses, true));
                out.push(',');
                out.push_str(&render(steps, true));
                if let Some(r) = rotation {
                    out.push(',');
                    out.push_str(&render(r, true));
                }
                out.push(')');
            }
            Modifier::Degrade { amount, .. } => {
                if (*amount - 0.5).abs() < f64::EPSILON {
                    out.push('?');
                } else {
                    out.push_str(&format!("??{}", number(*amount)));
                }
            }
            Modifier::Select(SelectArg::Index(n)) => {
                out.push_str(&format!(":{}", number(*n)));
            }
            Modifier::Select(SelectArg::Name(name)) => {
                out.push_str(&format!(":{}", name));
            }
        }
    }

    if step.weight != 1.0 {
        out.push_str(&format!("@{}", number(step.weight)));
    }
    if step.replicate > 1 {
        out.push_str(&format!("!{}", step.replicate));
    }
    out
}

fn number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roundtrip(source: &str) -> String {
        format(&parse(source).unwrap())
    }

    #[test]
    fn simple_sequences() {
        assert_eq!(roundtrip("bd sd cp"), "bd sd cp");
        assert_eq!(roundtrip("bd   sd"), "bd sd");
    }

    #[test]
    fn groups_and_modifiers() {
        assert_eq!(roundtrip("bd [sd cp]*2"), "bd [sd cp]*2");
        assert_eq!(roundtrip("bd(3,8,1)"), "bd(3,8,1)");
        assert_eq!(roundtrip("bd@3 sd!2"), "bd@3 sd!2");
        assert_eq!(roundtrip("bd:3 cp?"), "bd:3 cp?");
        assert_eq!(roundtrip("hh??0.25"), "hh??0.25");
    }

    #[test]
    fn rows_and_meters() {
        assert_eq!(roundtrip("bd sd, hh hh"), "bd sd, hh hh");
        assert_eq!(roundtrip("bd | sd"), "bd | sd");
        assert_eq!(roundtrip("{bd sd, cp}%4"), "{bd sd, cp}%4");
        assert_eq!(roundtrip("<bd sd> hh"), "<bd sd> hh");
    }

    #[test]
    fn formatting_is_stable() {
        for source in ["bd [sd cp]*2", "{bd sd, cp}%4", "bd(3,8) <hh oh>"] {
            let once = roundtrip(source);
            let twice = format(&parse(&once).unwrap());
            assert_eq!(once, twice);
        }
    }
}
