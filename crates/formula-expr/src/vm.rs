use crate::accessor::VariableAccessor;
use crate::error::EvalError;
use crate::functions::{self, CallContext};
use crate::lexer::LogicalOp;
use crate::program::{Instruction, Program, VariableSlot};
use smallvec::SmallVec;

/// Per-run inputs of a program: the values behind local slots, the bound accessor and the
/// `incsum` accumulator.
pub struct Frame<'a> {
    pub locals: &'a [f64],
    pub accessor: Option<&'a dyn VariableAccessor>,
    pub incremental_sum: &'a mut f64,
}

impl<'a> Frame<'a> {
    pub fn new(locals: &'a [f64], incremental_sum: &'a mut f64) -> Self {
        Self {
            locals,
            accessor: None,
            incremental_sum,
        }
    }

    #[must_use]
    pub fn with_accessor(mut self, accessor: Option<&'a dyn VariableAccessor>) -> Self {
        self.accessor = accessor;
        self
    }
}

/// Stack-based interpreter for [`Program`]s.
///
/// Next to the value stack the VM keeps a parallel stack of truth values: comparisons push
/// their raw outcome, every other instruction pushes `value != 0`. `and` and `or` combine the
/// truth values of their two operands. Reusing a `Vm` keeps its stack allocations.
#[derive(Clone, Debug, Default)]
pub struct Vm {
    stack: SmallVec<[f64; 32]>,
    truth: SmallVec<[bool; 32]>,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eval(&mut self, program: &Program, frame: Frame<'_>) -> Result<f64, EvalError> {
        self.stack.clear();
        self.truth.clear();
        if program.is_empty() {
            return Ok(0.0);
        }

        let Frame {
            locals,
            accessor,
            incremental_sum,
        } = frame;

        for instr in program.instrs() {
            match *instr {
                Instruction::Number(value) => self.push(value),
                Instruction::Variable(VariableSlot::Local(slot)) => {
                    let value = locals
                        .get(slot)
                        .copied()
                        .ok_or(EvalError::UnsupportedVariable { index: slot })?;
                    self.push(value);
                }
                Instruction::Variable(VariableSlot::Model(index)) => {
                    let accessor = accessor.ok_or(EvalError::NoAccessor)?;
                    self.push(accessor.value(index)?);
                }
                Instruction::Negate => {
                    let value = self.pop()?;
                    self.push(-value);
                }
                Instruction::Binary(op) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.push(op.apply(left, right));
                }
                Instruction::Compare(op) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.push_truth(op.apply(left, right));
                }
                Instruction::Logical(op) => {
                    let right = self.pop_truth()?;
                    let left = self.pop_truth()?;
                    self.push_truth(match op {
                        LogicalOp::And => left && right,
                        LogicalOp::Or => left || right,
                    });
                }
                Instruction::Call { func, argc } => {
                    let depth = self.stack.len();
                    let start = depth
                        .checked_sub(argc)
                        .ok_or(EvalError::StackUnbalanced { depth })?;
                    let mut ctx = CallContext {
                        incremental_sum: &mut *incremental_sum,
                        random: accessor.and_then(|a| a.random_source()),
                    };
                    let value = functions::call(func, &self.stack[start..], &mut ctx)?;
                    self.stack.truncate(start);
                    self.truth.truncate(start);
                    self.push(value);
                }
                Instruction::Stop => break,
            }
        }

        match self.stack.len() {
            1 => self.pop(),
            depth => Err(EvalError::StackUnbalanced { depth }),
        }
    }

    #[inline]
    fn push(&mut self, value: f64) {
        self.stack.push(value);
        self.truth.push(value != 0.0);
    }

    #[inline]
    fn push_truth(&mut self, truth: bool) {
        self.stack.push(if truth { 1.0 } else { 0.0 });
        self.truth.push(truth);
    }

    fn pop(&mut self) -> Result<f64, EvalError> {
        self.truth.pop();
        self.stack
            .pop()
            .ok_or(EvalError::StackUnbalanced { depth: 0 })
    }

    fn pop_truth(&mut self) -> Result<bool, EvalError> {
        self.stack.pop();
        self.truth
            .pop()
            .ok_or(EvalError::StackUnbalanced { depth: 0 })
    }
}

impl Program {
    /// Run this program with a fresh VM.
    ///
    /// Programs are immutable, so one compiled program can serve many threads as long as
    /// each run brings its own [`Frame`].
    pub fn run(&self, frame: Frame<'_>) -> Result<f64, EvalError> {
        Vm::new().eval(self, frame)
    }
}
