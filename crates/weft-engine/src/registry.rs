//! The global name scope for the host language.
//!
//! Built from a registry rather than static initialization: hosts add
//! sounds (and any custom builtins) at runtime, and each registered
//! sound becomes a no-arg combinator producing `{s: name}`. A one-slot
//! string reifier decides what bare strings mean; by default they are
//! mini notation.

use crate::diag::Diag;
use crate::lang::{
    as_factor, as_integer, as_name, as_number, as_pattern, as_rational, as_transform, eval,
    parse, tokenize, LangValue,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use weft_core::{
    cat, choose, euclid, fastcat, irand, isaw, polymeter, polyrhythm, pure, rng, saw, silence,
    sine, square, stack, steady, timecat, time_signal, tri, cosine, overlay, Pattern, Rational,
    Value,
};

type Builtin = Arc<dyn Fn(&Registry, Vec<LangValue>) -> Result<LangValue, Diag> + Send + Sync>;
type Reifier = Arc<dyn Fn(&str) -> Result<Pattern, Diag> + Send + Sync>;

pub struct Registry {
    builtins: HashMap<String, Builtin>,
    sounds: HashSet<String>,
    reifier: Reifier,
}

impl Registry {
    /// A scope with the standard combinator vocabulary and the mini
    /// notation as the string reifier.
    pub fn new() -> Self {
        let mut registry = Registry {
            builtins: HashMap::new(),
            sounds: HashSet::new(),
            reifier: Arc::new(|source| weft_mini::pattern(source).map_err(Diag::from)),
        };
        registry.install_defaults();
        registry
    }

    /// Turn user source into a pattern. All failures come back as
    /// diagnostics; a failed evaluation must never disturb whatever is
    /// already playing.
    pub fn evaluate(&self, source: &str) -> Result<Pattern, Diag> {
        let tokens = tokenize(source)?;
        let expr = parse(&tokens)?;
        match eval(self, &expr)? {
            LangValue::Pattern(p) => Ok(p),
            LangValue::Str(s) => self.reify(&s),
            other => Err(Diag::eval(format!(
                "expression evaluated to {:?}, not a pattern",
                other
            ))),
        }
    }

    /// Register a custom builtin.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Registry, Vec<LangValue>) -> Result<LangValue, Diag> + Send + Sync + 'static,
    {
        self.builtins.insert(name.into(), Arc::new(f));
    }

    /// Register a sound: `name` becomes a no-arg combinator producing
    /// `{s: name}` events, and the bare symbol resolves to it.
    pub fn register_sound(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.sounds.insert(name.clone());
        let value = Value::sound(name.clone());
        self.register(name, move |_, _| Ok(LangValue::Pattern(pure(value.clone()))));
    }

    pub fn is_sound(&self, name: &str) -> bool {
        self.sounds.contains(name)
    }

    /// Replace the string reifier (a single slot).
    pub fn set_string_reifier<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Result<Pattern, Diag> + Send + Sync + 'static,
    {
        self.reifier = Arc::new(f);
    }

    pub fn reify(&self, source: &str) -> Result<Pattern, Diag> {
        (self.reifier)(source)
    }

    /// A bare (non-head) symbol: transform names and sounds are
    /// first-class values, anything else falls back to a string and
    /// gets reified where a pattern is expected.
    pub fn resolve(&self, name: &str) -> Result<LangValue, Diag> {
        match name {
            "rev" => {
                return Ok(LangValue::Transform(Arc::new(|p: Pattern| Ok(p.rev()))))
            }
            "palindrome" => {
                return Ok(LangValue::Transform(Arc::new(|p: Pattern| {
                    Ok(p.palindrome())
                })))
            }
            "degrade" => {
                let node = rng::next_node_id();
                return Ok(LangValue::Transform(Arc::new(move |p: Pattern| {
                    Ok(p.degrade_by(0.5, node))
                })));
            }
            _ => {}
        }
        if self.sounds.contains(name) {
            return Ok(LangValue::Pattern(pure(Value::sound(name))));
        }
        if self.builtins.contains_key(name) {
            // Zero-argument application: `sine` works like `(sine)`.
            return self.apply(name, Vec::new());
        }
        Ok(LangValue::Str(name.to_string()))
    }

    pub fn apply(&self, name: &str, args: Vec<LangValue>) -> Result<LangValue, Diag> {
        match self.builtins.get(name) {
            Some(builtin) => builtin(self, args),
            None => Err(Diag::eval(format!("unknown function '{}'", name))),
        }
    }

    fn install_defaults(&mut self) {
        // Constructors ------------------------------------------------

        self.register("pure", |_, args| {
            one("pure", &args)?;
            let value = match &args[0] {
                LangValue::Number(n) => Value::Number(*n),
                LangValue::Str(s) => Value::String(s.clone()),
                other => {
                    return Err(Diag::eval(format!("pure expects a scalar, found {:?}", other)))
                }
            };
            Ok(LangValue::Pattern(pure(value)))
        });

        self.register("silence", |_, _| Ok(LangValue::Pattern(silence())));

        self.register("steady", |_, args| {
            one("steady", &args)?;
            let value = match &args[0] {
                LangValue::Number(n) => Value::Number(*n),
                LangValue::Str(s) => Value::String(s.clone()),
                other => {
                    return Err(Diag::eval(format!(
                        "steady expects a scalar, found {:?}",
                        other
                    )))
                }
            };
            Ok(LangValue::Pattern(steady(value)))
        });

        // Combination -------------------------------------------------

        self.register("seq", |reg, args| {
            Ok(LangValue::Pattern(fastcat(patterns(reg, args)?)))
        });
        self.register("fastcat", |reg, args| {
            Ok(LangValue::Pattern(fastcat(patterns(reg, args)?)))
        });
        self.register("cat", |reg, args| {
            Ok(LangValue::Pattern(cat(patterns(reg, args)?)))
        });
        self.register("slowcat", |reg, args| {
            Ok(LangValue::Pattern(cat(patterns(reg, args)?)))
        });
        self.register("stack", |reg, args| {
            Ok(LangValue::Pattern(stack(patterns(reg, args)?)))
        });
        self.register("overlay", |reg, mut args| {
            exactly("overlay", &args, 2)?;
            let b = as_pattern(reg, args.remove(1))?;
            let a = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(overlay(a, b)))
        });
        self.register("polyrhythm", |reg, args| {
            Ok(LangValue::Pattern(polyrhythm(patterns(reg, args)?)))
        });

        self.register("timecat", |reg, args| {
            if args.is_empty() || args.len() % 2 != 0 {
                return Err(Diag::eval(
                    "timecat expects weight/pattern pairs",
                ));
            }
            let mut weighted = Vec::new();
            let mut iter = args.into_iter();
            while let (Some(w), Some(p)) = (iter.next(), iter.next()) {
                weighted.push((as_rational(&w)?, as_pattern(reg, p)?));
            }
            Ok(LangValue::Pattern(timecat(weighted)))
        });

        self.register("polymeter", |reg, mut args| {
            if args.is_empty() {
                return Ok(LangValue::Pattern(silence()));
            }
            let steps = if matches!(args.first(), Some(LangValue::Number(_))) {
                let first = args.remove(0);
                let n = as_integer(&first)?;
                if n <= 0 {
                    return Err(Diag::eval("polymeter steps must be positive"));
                }
                Some(Rational::from_integer(n))
            } else {
                None
            };
            Ok(LangValue::Pattern(polymeter(patterns(reg, args)?, steps)))
        });

        // Time --------------------------------------------------------

        self.register("fast", |reg, mut args| match args.len() {
            1 => {
                let k = as_factor(&args[0])?;
                Ok(transform(move |p| Ok(p.fast(k))))
            }
            2 => {
                let k = as_factor(&args[0])?;
                let p = as_pattern(reg, args.remove(1))?;
                Ok(LangValue::Pattern(p.fast(k)))
            }
            n => Err(wrong_arity("fast", "1 or 2", n)),
        });

        self.register("slow", |reg, mut args| match args.len() {
            1 => {
                let k = as_factor(&args[0])?;
                Ok(transform(move |p| Ok(p.slow(k))))
            }
            2 => {
                let k = as_factor(&args[0])?;
                let p = as_pattern(reg, args.remove(1))?;
                Ok(LangValue::Pattern(p.slow(k)))
            }
            n => Err(wrong_arity("slow", "1 or 2", n)),
        });

        self.register("early", |reg, mut args| match args.len() {
            1 => {
                let t = as_rational(&args[0])?;
                Ok(transform(move |p| Ok(p.early(t))))
            }
            2 => {
                let t = as_rational(&args[0])?;
                let p = as_pattern(reg, args.remove(1))?;
                Ok(LangValue::Pattern(p.early(t)))
            }
            n => Err(wrong_arity("early", "1 or 2", n)),
        });

        self.register("late", |reg, mut args| match args.len() {
            1 => {
                let t = as_rational(&args[0])?;
                Ok(transform(move |p| Ok(p.late(t))))
            }
            2 => {
                let t = as_rational(&args[0])?;
                let p = as_pattern(reg, args.remove(1))?;
                Ok(LangValue::Pattern(p.late(t)))
            }
            n => Err(wrong_arity("late", "1 or 2", n)),
        });

        self.register("rev", |reg, mut args| {
            one("rev", &args)?;
            let p = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(p.rev()))
        });

        self.register("palindrome", |reg, mut args| {
            one("palindrome", &args)?;
            let p = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(p.palindrome()))
        });

        self.register("ply", |reg, mut args| match args.len() {
            1 => {
                let n = positive("ply", as_integer(&args[0])?)?;
                Ok(transform(move |p| Ok(p.ply(n))))
            }
            2 => {
                let n = positive("ply", as_integer(&args[0])?)?;
                let p = as_pattern(reg, args.remove(1))?;
                Ok(LangValue::Pattern(p.ply(n)))
            }
            n => Err(wrong_arity("ply", "1 or 2", n)),
        });

        self.register("iter", |reg, mut args| match args.len() {
            1 => {
                let n = positive("iter", as_integer(&args[0])?)?;
                Ok(transform(move |p| Ok(p.iter(n))))
            }
            2 => {
                let n = positive("iter", as_integer(&args[0])?)?;
                let p = as_pattern(reg, args.remove(1))?;
                Ok(LangValue::Pattern(p.iter(n)))
            }
            n => Err(wrong_arity("iter", "1 or 2", n)),
        });

        self.register("iterback", |reg, mut args| {
            exactly("iterback", &args, 2)?;
            let n = positive("iterback", as_integer(&args[0])?)?;
            let p = as_pattern(reg, args.remove(1))?;
            Ok(LangValue::Pattern(p.iter_back(n)))
        });

        self.register("compress", |reg, mut args| {
            exactly("compress", &args, 3)?;
            let b = as_rational(&args[0])?;
            let e = as_rational(&args[1])?;
            let p = as_pattern(reg, args.remove(2))?;
            Ok(LangValue::Pattern(p.compress(b, e)))
        });

        self.register("zoom", |reg, mut args| {
            exactly("zoom", &args, 3)?;
            let b = as_rational(&args[0])?;
            let e = as_rational(&args[1])?;
            let p = as_pattern(reg, args.remove(2))?;
            Ok(LangValue::Pattern(p.zoom(b, e)))
        });

        self.register("linger", |reg, mut args| {
            exactly("linger", &args, 2)?;
            let t = as_rational(&args[0])?;
            let p = as_pattern(reg, args.remove(1))?;
            Ok(LangValue::Pattern(p.linger(t)))
        });

        // Structure ---------------------------------------------------

        self.register("euclid", |reg, mut args| {
            if args.len() != 3 && args.len() != 4 {
                return Err(wrong_arity("euclid", "3 or 4", args.len()));
            }
            let k = non_negative("euclid", as_integer(&args[0])?)?;
            let n = positive("euclid", as_integer(&args[1])?)?;
            let rot = if args.len() == 4 {
                as_integer(&args[2])?.rem_euclid(n) as usize
            } else {
                0
            };
            let p = as_pattern(reg, args.pop().expect("arity checked"))?;
            Ok(LangValue::Pattern(
                p.struct_(euclid(k as usize, n as usize, rot)),
            ))
        });

        self.register("struct", |reg, mut args| {
            exactly("struct", &args, 2)?;
            let v = as_pattern(reg, args.remove(1))?;
            let b = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(v.struct_(b)))
        });

        self.register("mask", |reg, mut args| {
            exactly("mask", &args, 2)?;
            let v = as_pattern(reg, args.remove(1))?;
            let b = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(v.mask(b)))
        });

        self.register("every", |reg, mut args| {
            exactly("every", &args, 3)?;
            let n = positive("every", as_integer(&args[0])?)?;
            let p = as_pattern(reg, args.remove(2))?;
            let f = as_transform(args.remove(1))?;
            Ok(LangValue::Pattern(p.every(n, move |pat| {
                f(pat).unwrap_or_else(|_| silence())
            })))
        });

        self.register("off", |reg, mut args| {
            exactly("off", &args, 3)?;
            let t = as_rational(&args[0])?;
            let p = as_pattern(reg, args.remove(2))?;
            let f = as_transform(args.remove(1))?;
            Ok(LangValue::Pattern(p.off(t, move |pat| {
                f(pat).unwrap_or_else(|_| silence())
            })))
        });

        self.register("chunk", |reg, mut args| {
            exactly("chunk", &args, 3)?;
            let n = positive("chunk", as_integer(&args[0])?)?;
            let p = as_pattern(reg, args.remove(2))?;
            let f = as_transform(args.remove(1))?;
            Ok(LangValue::Pattern(p.chunk(n, move |pat| {
                f(pat).unwrap_or_else(|_| silence())
            })))
        });

        self.register("superimpose", |reg, mut args| {
            exactly("superimpose", &args, 2)?;
            let p = as_pattern(reg, args.remove(1))?;
            let f = as_transform(args.remove(0))?;
            Ok(LangValue::Pattern(p.superimpose(move |pat| {
                f(pat).unwrap_or_else(|_| silence())
            })))
        });

        self.register("within", |reg, mut args| {
            exactly("within", &args, 4)?;
            let b = as_rational(&args[0])?;
            let e = as_rational(&args[1])?;
            let p = as_pattern(reg, args.remove(3))?;
            let f = as_transform(args.remove(2))?;
            Ok(LangValue::Pattern(p.within(b, e, move |pat| {
                f(pat).unwrap_or_else(|_| silence())
            })))
        });

        // Randomness --------------------------------------------------

        self.register("degrade", |reg, mut args| {
            one("degrade", &args)?;
            let p = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(p.degrade_by(0.5, rng::next_node_id())))
        });

        self.register("degradeby", |reg, mut args| {
            exactly("degradeby", &args, 2)?;
            let amount = probability("degradeby", as_number(&args[0])?)?;
            let p = as_pattern(reg, args.remove(1))?;
            Ok(LangValue::Pattern(
                p.degrade_by(amount, rng::next_node_id()),
            ))
        });

        self.register("sometimes", |reg, mut args| {
            exactly("sometimes", &args, 2)?;
            let p = as_pattern(reg, args.remove(1))?;
            let f = as_transform(args.remove(0))?;
            Ok(LangValue::Pattern(p.sometimes_by(
                0.5,
                rng::next_node_id(),
                move |pat| f(pat).unwrap_or_else(|_| silence()),
            )))
        });

        self.register("sometimesby", |reg, mut args| {
            exactly("sometimesby", &args, 3)?;
            let amount = probability("sometimesby", as_number(&args[0])?)?;
            let p = as_pattern(reg, args.remove(2))?;
            let f = as_transform(args.remove(1))?;
            Ok(LangValue::Pattern(p.sometimes_by(
                amount,
                rng::next_node_id(),
                move |pat| f(pat).unwrap_or_else(|_| silence()),
            )))
        });

        self.register("choose", |reg, args| {
            Ok(LangValue::Pattern(choose(
                patterns(reg, args)?,
                rng::next_node_id(),
            )))
        });

        // Values ------------------------------------------------------

        self.register("add", arith("add", Pattern::add));
        self.register("sub", arith("sub", Pattern::sub));
        self.register("mul", arith("mul", Pattern::mul));
        self.register("div", arith("div", Pattern::div));

        self.register("union", |reg, mut args| {
            exactly("union", &args, 2)?;
            let b = as_pattern(reg, args.remove(1))?;
            let a = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(a.union_left(b)))
        });

        self.register("#", |reg, mut args| {
            exactly("#", &args, 2)?;
            let b = as_pattern(reg, args.remove(1))?;
            let a = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(a.union_right(b)))
        });

        self.register("range", |reg, mut args| {
            exactly("range", &args, 3)?;
            let lo = as_number(&args[0])?;
            let hi = as_number(&args[1])?;
            let p = as_pattern(reg, args.remove(2))?;
            Ok(LangValue::Pattern(p.range(lo, hi)))
        });

        // Controls: (s "bd sd") gives {s: bd} {s: sd}, and so on.
        for key in ["s", "n", "note", "gain", "pan", "speed", "room", "orbit"] {
            self.register(key, move |reg, mut args| {
                one(key, &args)?;
                let p = as_pattern(reg, args.remove(0))?;
                let key = key.to_string();
                Ok(LangValue::Pattern(p.with_value(move |v| match v {
                    Value::Map(_) => v,
                    scalar => Value::map_from([(key.clone(), scalar)]),
                })))
            });
        }

        // Signals -----------------------------------------------------

        self.register("sine", |_, _| Ok(LangValue::Pattern(sine())));
        self.register("cosine", |_, _| Ok(LangValue::Pattern(cosine())));
        self.register("saw", |_, _| Ok(LangValue::Pattern(saw())));
        self.register("isaw", |_, _| Ok(LangValue::Pattern(isaw())));
        self.register("tri", |_, _| Ok(LangValue::Pattern(tri())));
        self.register("square", |_, _| Ok(LangValue::Pattern(square())));
        self.register("time", |_, _| Ok(LangValue::Pattern(time_signal())));
        self.register("rand", |_, _| Ok(LangValue::Pattern(weft_core::rand())));
        self.register("irand", |_, args| {
            one("irand", &args)?;
            let n = positive("irand", as_integer(&args[0])?)?;
            Ok(LangValue::Pattern(irand(n)))
        });

        // Notation ----------------------------------------------------

        self.register("mini", |reg, args| {
            one("mini", &args)?;
            let source = as_name(&args[0])?;
            Ok(LangValue::Pattern(reg.reify(&source)?))
        });
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// Builtin helpers

fn transform<F>(f: F) -> LangValue
where
    F: Fn(Pattern) -> Result<Pattern, Diag> + Send + Sync + 'static,
{
    LangValue::Transform(Arc::new(f))
}

fn patterns(reg: &Registry, args: Vec<LangValue>) -> Result<Vec<Pattern>, Diag> {
    args.into_iter().map(|a| as_pattern(reg, a)).collect()
}

fn arith(
    name: &'static str,
    op: fn(Pattern, Pattern) -> Pattern,
) -> impl Fn(&Registry, Vec<LangValue>) -> Result<LangValue, Diag> + Send + Sync + 'static {
    move |reg, mut args| match args.len() {
        1 => {
            let rhs = as_pattern(reg, args.remove(0))?;
            Ok(transform(move |p| Ok(op(p, rhs.clone()))))
        }
        2 => {
            let rhs = as_pattern(reg, args.remove(1))?;
            let lhs = as_pattern(reg, args.remove(0))?;
            Ok(LangValue::Pattern(op(lhs, rhs)))
        }
        n => Err(wrong_arity(name, "1 or 2", n)),
    }
}

fn one(name: &str, args: &[LangValue]) -> Result<(), Diag> {
    exactly(name, args, 1)
}

fn exactly(name: &str, args: &[LangValue], expected: usize) -> Result<(), Diag> {
    if args.len() != expected {
        return Err(wrong_arity(name, &expected.to_string(), args.len()));
    }
    Ok(())
}

fn wrong_arity(name: &str, expected: &str, got: usize) -> Diag {
    Diag::eval(format!(
        "{} expects {} argument(s), got {}",
        name, expected, got
    ))
}

fn positive(name: &str, n: i64) -> Result<i64, Diag> {
    if n <= 0 {
        return Err(Diag::eval(format!("{} expects a positive count", name)));
    }
    Ok(n)
}

fn non_negative(name: &str, n: i64) -> Result<i64, Diag> {
    if n < 0 {
        return Err(Diag::eval(format!("{} expects a non-negative count", name)));
    }
    Ok(n)
}

fn probability(name: &str, p: f64) -> Result<f64, Diag> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Diag::eval(format!(
            "{} expects a probability between 0 and 1",
            name
        )));
    }
    Ok(p)
}
