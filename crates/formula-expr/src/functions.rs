//! Built-in function table and the numeric helpers behind it.
//!
//! The table is closed: formulas cannot define functions. Each entry has a fixed name and an
//! [`Arity`] that the parser checks against the observed argument count.

use crate::error::EvalError;
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    /// Any count of at least `n`.
    AtLeast(usize),
    /// `polygon(value, x1, y1, ..., xn, yn)`: a value plus two or more (x, y) pairs.
    Polygon,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Polygon => count >= 5 && count % 2 == 1,
        }
    }

    pub(crate) fn describe(self) -> &'static str {
        match self {
            Arity::Exactly(1) => "1",
            Arity::Exactly(2) => "2",
            Arity::Exactly(3) => "3",
            Arity::Exactly(4) => "4",
            Arity::Exactly(_) => "a fixed number of",
            Arity::AtLeast(1) => "at least 1",
            Arity::AtLeast(2) => "at least 2",
            Arity::AtLeast(_) => "a minimum number of",
            Arity::Polygon => "an odd number (at least 5) of",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
    Min,
    Max,
    If,
    IncSum,
    Polygon,
    Mod,
    Sigmoid,
    Rnd,
    Rndg,
    In,
    Round,
}

impl Function {
    pub const ALL: [Function; 17] = [
        Function::Sin,
        Function::Cos,
        Function::Tan,
        Function::Exp,
        Function::Ln,
        Function::Sqrt,
        Function::Min,
        Function::Max,
        Function::If,
        Function::IncSum,
        Function::Polygon,
        Function::Mod,
        Function::Sigmoid,
        Function::Rnd,
        Function::Rndg,
        Function::In,
        Function::Round,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Function::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Sqrt => "sqrt",
            Function::Min => "min",
            Function::Max => "max",
            Function::If => "if",
            Function::IncSum => "incsum",
            Function::Polygon => "polygon",
            Function::Mod => "mod",
            Function::Sigmoid => "sigmoid",
            Function::Rnd => "rnd",
            Function::Rndg => "rndg",
            Function::In => "in",
            Function::Round => "round",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Function::Sin
            | Function::Cos
            | Function::Tan
            | Function::Exp
            | Function::Ln
            | Function::Sqrt
            | Function::IncSum
            | Function::Round => Arity::Exactly(1),
            Function::Mod | Function::Rnd | Function::Rndg => Arity::Exactly(2),
            Function::If => Arity::Exactly(3),
            Function::Sigmoid => Arity::Exactly(4),
            Function::Min | Function::Max => Arity::AtLeast(1),
            Function::In => Arity::AtLeast(2),
            Function::Polygon => Arity::Polygon,
        }
    }

    /// Whether repeated calls with the same arguments may return different values.
    pub fn is_stateful(self) -> bool {
        matches!(self, Function::IncSum | Function::Rnd | Function::Rndg)
    }
}

/// Mutable state a function call may touch.
pub(crate) struct CallContext<'a> {
    pub incremental_sum: &'a mut f64,
    pub random: Option<&'a dyn RandomSource>,
}

/// Apply `func` to its already evaluated arguments (left to right).
///
/// The parser guarantees `args.len()` satisfies the function's [`Arity`].
pub(crate) fn call(
    func: Function,
    args: &[f64],
    ctx: &mut CallContext<'_>,
) -> Result<f64, EvalError> {
    let value = match (func, args) {
        (Function::Sin, [x]) => x.sin(),
        (Function::Cos, [x]) => x.cos(),
        (Function::Tan, [x]) => x.tan(),
        (Function::Exp, [x]) => x.exp(),
        (Function::Ln, [x]) => x.ln(),
        (Function::Sqrt, [x]) => x.sqrt(),
        (Function::Min, [first, rest @ ..]) => rest
            .iter()
            .fold(*first, |acc, &v| if v < acc { v } else { acc }),
        (Function::Max, [first, rest @ ..]) => rest
            .iter()
            .fold(*first, |acc, &v| if v > acc { v } else { acc }),
        // Both branches were evaluated before the call; only the selection happens here.
        (Function::If, [cond, when_true, when_false]) => {
            if *cond == 1.0 {
                *when_true
            } else {
                *when_false
            }
        }
        (Function::IncSum, [x]) => {
            *ctx.incremental_sum += x;
            *ctx.incremental_sum
        }
        (Function::Polygon, [value, points @ ..]) => polygon(*value, points),
        (Function::Mod, [x, y]) => x % y,
        (Function::Sigmoid, [x, kind, p1, p2]) => sigmoid(*x, *kind, *p1, *p2)?,
        (Function::Rnd, [low, high]) => {
            ctx.random.ok_or(EvalError::NoRandomSource)?.uniform(*low, *high)
        }
        (Function::Rndg, [mean, std_dev]) => {
            ctx.random.ok_or(EvalError::NoRandomSource)?.normal(*mean, *std_dev)
        }
        (Function::In, [value, candidates @ ..]) => in_list(*value, candidates),
        (Function::Round, [x]) => round_half_away(*x),
        _ => {
            return Err(EvalError::StackUnbalanced { depth: args.len() });
        }
    };
    Ok(value)
}

/// Piecewise-linear lookup through `(x, y)` pairs given in ascending `x` order.
///
/// Flat beyond both ends: left of the first `x` the first `y` is returned, right of the last
/// `x` the last `y`.
pub fn polygon(value: f64, points: &[f64]) -> f64 {
    let mut pairs = points.chunks_exact(2).rev();
    let Some(last) = pairs.next() else {
        return f64::NAN;
    };
    let (mut x, mut y) = (last[0], last[1]);
    if value > x {
        return y;
    }
    for pair in pairs {
        let (x_right, y_right) = (x, y);
        x = pair[0];
        y = pair[1];
        if value > x {
            return (y_right - y) / (x_right - x) * (value - x) + y;
        }
    }
    y
}

/// `sigmoid(x, type, p1, p2)` with `x` clamped to `[0, 1]`.
///
/// Types: 0 logistic `1/(1 + p1*e^(-p2*x))`, 1 Hill `x^p1/(p2^p1 + x^p1)`, 2 and 3 are one minus
/// the respective curve.
pub fn sigmoid(x: f64, kind: f64, p1: f64, p2: f64) -> Result<f64, EvalError> {
    let x = x.min(1.0).max(0.0);
    let kind = kind as i64;
    let result = match kind {
        0 | 2 => 1.0 / (1.0 + p1 * (-p2 * x).exp()),
        1 | 3 => x.powf(p1) / (p2.powf(p1) + x.powf(p1)),
        _ => return Err(EvalError::InvalidSigmoidType { kind }),
    };
    Ok(if kind >= 2 { 1.0 - result } else { result })
}

pub fn in_list(value: f64, candidates: &[f64]) -> f64 {
    if candidates.iter().any(|&c| c == value) {
        1.0
    } else {
        0.0
    }
}

/// Round half away from zero.
pub fn round_half_away(x: f64) -> f64 {
    if x < 0.0 {
        (x - 0.5).ceil()
    } else {
        (x + 0.5).floor()
    }
}
