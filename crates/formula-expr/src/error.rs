//! Error taxonomy for compiling and running expressions.
//!
//! Parse-time and evaluate-time failures are kept in separate enums so hosts can tell a
//! malformed project formula apart from a missing runtime binding. Every variant is a stable
//! signal; callers are expected to match on variants rather than on messages.

/// Failure while turning formula text into a [`crate::Program`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A production consumed no tokens, typically a stray `)` or `}`.
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,
    /// The tokenizer hit a character it does not recognize.
    #[error("syntax error near '{token}'")]
    SyntaxError { token: String },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token '{token}'")]
    UnexpectedToken { token: String },
    #[error("invalid number '{literal}'")]
    InvalidNumber { literal: String },
    #[error("function '{name}' is not defined")]
    UnknownFunction { name: String },
    #[error("function '{function}' expects {expected} argument(s), found {found}")]
    ArgumentCount {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("missing closing bracket for function '{function}'")]
    MissingClosingBracket { function: &'static str },
    /// Strict binding: the name is neither known to the accessor nor registered locally.
    #[error("variable '{name}' is not available")]
    VariableNotAvailable { name: String },
    #[error("expression nesting exceeds {max} levels", max = crate::parser::MAX_NESTING)]
    NestingTooDeep,
    #[error("too many local variables (at most {max})", max = crate::MAX_LOCAL_VARIABLES)]
    TooManyVariables,
    /// A complete expression was followed by more input, e.g. `1 2`.
    #[error("unexpected trailing input '{token}'")]
    TrailingInput { token: String },
}

/// Failure while running a compiled [`crate::Program`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The value stack did not end with exactly one entry.
    #[error("stack unbalanced (final depth {depth})")]
    StackUnbalanced { depth: usize },
    #[error("variable slot {index} is not supported")]
    UnsupportedVariable { index: usize },
    #[error("expression references model variables but no accessor is bound")]
    NoAccessor,
    #[error("no random number source is bound")]
    NoRandomSource,
    #[error("the current year was requested but no simulation time is bound")]
    NoSimulationTime,
    #[error("accessor has no variable with index {index}")]
    UnknownVariableIndex { index: usize },
    #[error("accessor has no variable named '{name}'")]
    UnknownVariableName { name: String },
    #[error("invalid sigmoid type {kind}; allowed: 0..=3")]
    InvalidSigmoidType { kind: i64 },
}

/// Either family of failure, plus errors from the expression object itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("invalid linearization domain [{low}, {high}] with {steps} step(s)")]
    InvalidDomain { low: f64, high: f64, steps: usize },
    /// Only local slots can be assigned by name.
    #[error("'{name}' is not a local variable of this expression")]
    UnknownVariable { name: String },
    #[error("invalid expression settings: {0}")]
    Settings(String),
}

pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Which fixed formula shape a specialized parser expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecializedKind {
    Aging,
    HeightDiameterRatio,
}

impl std::fmt::Display for SpecializedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecializedKind::Aging => f.write_str("aging curve 1/(1 + (x/A)^B)"),
            SpecializedKind::HeightDiameterRatio => {
                f.write_str("height:diameter ratio bound [min(] M*d^E [, bound)]")
            }
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("expression '{expression}' doesn't match the expected form: {kind}")]
pub struct SpecializedFormError {
    pub kind: SpecializedKind,
    pub expression: String,
}

impl SpecializedFormError {
    pub(crate) fn new(kind: SpecializedKind, expression: &str) -> Self {
        Self {
            kind,
            expression: expression.to_string(),
        }
    }
}
