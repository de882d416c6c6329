#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! Embedded formula interpreter for model parameters supplied as text.
//!
//! Formulas such as `if(dbh>10, 1.2*dbh^0.8, 0)` are compiled once into a flat post-order
//! [`Program`] and evaluated by a small stack [`Vm`]. Variables bind either to the formula's
//! own local slots or to a host object through [`VariableAccessor`].
//!
//! ```text
//! text --lexer--> tokens --parser--> Program --vm--> f64
//!                                       \--linearize--> lookup table
//! ```
//!
//! Most hosts use [`Expression`], which owns the text, compiles lazily and keeps per-instance
//! state (local values, the `incsum` accumulator, an optional linearization table). Formulas of
//! two fixed shapes evaluated per tree can skip the compiler entirely through
//! [`specialized`].
//!
//! Evaluation is eager: `and`, `or` and `if` always evaluate both operands, so stateful
//! functions (`incsum`, `rnd`, `rndg`) in a branch not taken still run.
//!
//! Performance is tracked by [`run_benchmarks`]; see the `perf_bench` binary.

pub mod accessor;
pub mod error;
pub mod expression;
pub mod functions;
pub mod lexer;
pub mod linearize;
pub mod parser;
pub mod perf;
pub mod program;
pub mod random;
pub mod settings;
pub mod specialized;
pub mod vm;

/// Upper bound on local variable slots per expression.
pub const MAX_LOCAL_VARIABLES: usize = 100;

pub use accessor::{BaseVariables, NamedValues, SimulationTime, VariableAccessor};
pub use error::{
    EvalError, ExpressionError, ExpressionResult, ParseError, SpecializedFormError,
    SpecializedKind,
};
pub use expression::Expression;
pub use functions::{Arity, Function};
pub use linearize::Linearization;
pub use parser::{compile, Binding};
pub use perf::{run_benchmarks, BenchmarkResult};
pub use program::{Instruction, Program, VariableSlot};
pub use random::{RandomSource, SharedRng};
pub use settings::ExpressionSettings;
pub use specialized::{AgingCurve, HeightDiameterRatioBound};
pub use vm::{Frame, Vm};
