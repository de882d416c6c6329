use crate::functions::Function;
use crate::lexer::{CompareOp, LogicalOp};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            '*' => Some(BinaryOp::Mul),
            '/' => Some(BinaryOp::Div),
            '^' => Some(BinaryOp::Pow),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Pow => '^',
        }
    }

    #[inline]
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Sub => left - right,
            BinaryOp::Mul => left * right,
            BinaryOp::Div => left / right,
            BinaryOp::Pow => left.powf(right),
        }
    }
}

/// Where a variable's value comes from at run time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableSlot {
    /// Slot in the expression's own value array (`0..MAX_LOCAL_VARIABLES`).
    Local(usize),
    /// Index into the bound accessor's variable list.
    Model(usize),
}

/// One post-order instruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    Number(f64),
    Variable(VariableSlot),
    Negate,
    Binary(BinaryOp),
    Compare(CompareOp),
    Logical(LogicalOp),
    Call { func: Function, argc: usize },
    /// Terminates every program exactly once.
    Stop,
}

/// A compiled expression: a flat post-order instruction list ending in [`Instruction::Stop`].
///
/// Programs are immutable once built and can be shared between threads; all per-evaluation
/// state (local values, the `incsum` accumulator, the VM stack) lives with the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub(crate) instrs: Vec<Instruction>,
    /// Local variable names at the time of compilation, indexed by slot.
    pub(crate) locals: Vec<String>,
}

impl Program {
    pub(crate) fn new() -> Self {
        Self {
            instrs: Vec::new(),
            locals: Vec::new(),
        }
    }

    #[inline]
    pub fn instrs(&self) -> &[Instruction] {
        &self.instrs
    }

    /// Number of instructions excluding the trailing stop.
    pub fn len(&self) -> usize {
        self.instrs
            .iter()
            .filter(|i| !matches!(i, Instruction::Stop))
            .count()
    }

    /// Constant time: the only stop is the last instruction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instrs.len() <= 1
    }

    /// True iff no variable is ever loaded.
    pub fn is_constant(&self) -> bool {
        !self
            .instrs
            .iter()
            .any(|i| matches!(i, Instruction::Variable(_)))
    }

    /// Whether evaluating twice with the same inputs may differ (`incsum`, `rnd`, `rndg`).
    pub fn is_stateful(&self) -> bool {
        self.instrs
            .iter()
            .any(|i| matches!(i, Instruction::Call { func, .. } if func.is_stateful()))
    }

    pub fn local_names(&self) -> &[String] {
        &self.locals
    }
}

impl fmt::Display for Program {
    /// Post-order listing, e.g. `x 2 * <stop>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, instr) in self.instrs.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            match instr {
                Instruction::Number(n) => write!(f, "{n}")?,
                Instruction::Variable(VariableSlot::Local(slot)) => match self.locals.get(*slot) {
                    Some(name) => f.write_str(name)?,
                    None => write!(f, "local[{slot}]")?,
                },
                Instruction::Variable(VariableSlot::Model(index)) => write!(f, "model[{index}]")?,
                Instruction::Negate => f.write_str("neg")?,
                Instruction::Binary(op) => write!(f, "{}", op.symbol())?,
                Instruction::Compare(op) => f.write_str(op.symbol())?,
                Instruction::Logical(LogicalOp::And) => f.write_str("and")?,
                Instruction::Logical(LogicalOp::Or) => f.write_str("or")?,
                Instruction::Call { func, argc } => write!(f, "{}/{argc}", func.name())?,
                Instruction::Stop => f.write_str("<stop>")?,
            }
        }
        Ok(())
    }
}
