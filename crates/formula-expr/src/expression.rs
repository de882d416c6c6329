//! The compiled expression object hosts hold on to.
//!
//! An [`Expression`] owns its formula text, compiles it lazily on first use and keeps the
//! compiled [`Program`] until the text is replaced. It also owns the state that belongs to one
//! formula instance: local variable slots, the `incsum` accumulator and an optional
//! linearization table.

use crate::accessor::VariableAccessor;
use crate::error::{ExpressionError, ExpressionResult, ParseError};
use crate::linearize::{Axis, Linearization, Table1d, Table2d};
use crate::parser::{self, Binding};
use crate::program::Program;
use crate::settings::ExpressionSettings;
use crate::vm::{Frame, Vm};
use crate::MAX_LOCAL_VARIABLES;
use smallvec::SmallVec;
use std::fmt;

#[derive(Clone, Debug)]
pub struct Expression {
    source: String,
    program: Option<Program>,
    local_names: Vec<String>,
    local_values: Vec<f64>,
    binding: Binding,
    incremental_sum: f64,
    linearization: Option<Linearization>,
    vm: Vm,
}

impl Default for Expression {
    fn default() -> Self {
        Self {
            source: String::new(),
            program: None,
            local_names: Vec::new(),
            local_values: Vec::new(),
            binding: Binding::Strict,
            incremental_sum: 0.0,
            linearization: None,
            vm: Vm::new(),
        }
    }
}

impl Expression {
    pub fn new(text: &str) -> Self {
        let mut expr = Self::default();
        expr.set_expression(text);
        expr
    }

    /// Replace the formula text.
    ///
    /// Drops the compiled program and any linearization, zeroes local values and switches back
    /// to strict binding. Registered local names are kept. Nothing is parsed here.
    pub fn set_expression(&mut self, text: &str) {
        self.source = text.split_whitespace().collect::<Vec<_>>().join(" ");
        self.program = None;
        self.linearization = None;
        self.local_values.iter_mut().for_each(|v| *v = 0.0);
        self.binding = Binding::Strict;
    }

    /// Replace the formula text and compile it right away with lax binding.
    pub fn set_and_parse(&mut self, text: &str) -> Result<(), ParseError> {
        self.set_expression(text);
        self.binding = Binding::Lax;
        self.parse(None)
    }

    /// Compile the current text unless that already happened.
    ///
    /// Names known to `accessor` bind to it; everything else resolves to local slots, which
    /// in lax mode are registered on first sight.
    pub fn parse(&mut self, accessor: Option<&dyn VariableAccessor>) -> Result<(), ParseError> {
        if self.program.is_some() {
            return Ok(());
        }
        let program =
            parser::compile(&self.source, &mut self.local_names, accessor, self.binding)?;
        self.local_values.resize(self.local_names.len(), 0.0);
        log::debug!(
            "compiled '{}' into {} instruction(s), constant: {}",
            self.source,
            program.len(),
            program.is_constant()
        );
        self.program = Some(program);
        Ok(())
    }

    /// Run the expression with its own local values.
    pub fn execute(&mut self, accessor: Option<&dyn VariableAccessor>) -> ExpressionResult<f64> {
        self.parse(accessor)?;
        let Some(program) = &self.program else {
            return Ok(0.0);
        };
        let frame =
            Frame::new(&self.local_values, &mut self.incremental_sum).with_accessor(accessor);
        Ok(self.vm.eval(program, frame)?)
    }

    /// Run the expression against caller-supplied local values, indexed by slot.
    pub fn execute_with(
        &mut self,
        values: &[f64],
        accessor: Option<&dyn VariableAccessor>,
    ) -> ExpressionResult<f64> {
        self.parse(accessor)?;
        let Some(program) = &self.program else {
            return Ok(0.0);
        };
        let frame = Frame::new(values, &mut self.incremental_sum).with_accessor(accessor);
        Ok(self.vm.eval(program, frame)?)
    }

    /// Evaluate as a function of one argument bound to the first local slot.
    pub fn evaluate(&mut self, x: f64) -> ExpressionResult<f64> {
        self.evaluate2(x, 0.0)
    }

    /// Evaluate as a function of two arguments bound to the first two local slots.
    ///
    /// Uses the linearization table when one exists and `(x, y)` lies inside it.
    pub fn evaluate2(&mut self, x: f64, y: f64) -> ExpressionResult<f64> {
        if let Some(table) = &self.linearization {
            if let Some(value) = table.lookup(x, y) {
                return Ok(value);
            }
            log::trace!("({x}, {y}) outside the linearized domain of '{}'", self.source);
        }
        self.evaluate_forced(x, y)
    }

    /// Like [`Expression::evaluate2`] but always runs the program.
    pub fn evaluate_forced(&mut self, x: f64, y: f64) -> ExpressionResult<f64> {
        self.run_with_arguments(None, x, y)
    }

    /// Evaluate with `x`/`y` in the first two local slots and model variables resolved through
    /// `accessor`. Never linearized.
    pub fn evaluate_with(
        &mut self,
        accessor: &dyn VariableAccessor,
        x: f64,
        y: f64,
    ) -> ExpressionResult<f64> {
        self.run_with_arguments(Some(accessor), x, y)
    }

    fn run_with_arguments(
        &mut self,
        accessor: Option<&dyn VariableAccessor>,
        x: f64,
        y: f64,
    ) -> ExpressionResult<f64> {
        self.binding = Binding::Lax;
        self.parse(accessor)?;
        let Some(program) = &self.program else {
            return Ok(0.0);
        };
        let mut values: SmallVec<[f64; 8]> =
            SmallVec::from_elem(0.0, self.local_names.len().max(2));
        values[0] = x;
        values[1] = y;
        let frame = Frame::new(&values, &mut self.incremental_sum).with_accessor(accessor);
        Ok(self.vm.eval(program, frame)?)
    }

    /// Assign a local variable, compiling first if necessary.
    pub fn set_variable(&mut self, name: &str, value: f64) -> ExpressionResult<()> {
        self.parse(None)?;
        let slot = self
            .local_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ExpressionError::UnknownVariable {
                name: name.to_string(),
            })?;
        self.local_values[slot] = value;
        Ok(())
    }

    /// Register a local variable and return its slot. Registering a known name returns the
    /// existing slot.
    pub fn add_variable(&mut self, name: &str) -> Result<usize, ParseError> {
        if let Some(slot) = self.local_names.iter().position(|n| n == name) {
            return Ok(slot);
        }
        if self.local_names.len() >= MAX_LOCAL_VARIABLES {
            return Err(ParseError::TooManyVariables);
        }
        self.local_names.push(name.to_string());
        self.local_values.push(0.0);
        Ok(self.local_names.len() - 1)
    }

    /// Local variable names in slot order.
    pub fn variable_names(&self) -> &[String] {
        &self.local_names
    }

    /// Reset the `incsum` accumulator to zero.
    pub fn enable_incremental_sum(&mut self) {
        self.incremental_sum = 0.0;
    }

    pub fn incremental_sum(&self) -> f64 {
        self.incremental_sum
    }

    /// Replace any existing table with a 1-D table over `[low, high]`.
    pub fn linearize(&mut self, low: f64, high: f64, steps: usize) -> ExpressionResult<()> {
        self.linearization = None;
        let axis = Axis::new(low, high, steps)?;
        let table = Table1d::build(axis, |x| self.evaluate_forced(x, 0.0))?;
        log::debug!(
            "linearized '{}' over [{low}, {high}] with {} node(s)",
            self.source,
            axis.nodes()
        );
        self.linearization = Some(Linearization::OneD(table));
        Ok(())
    }

    /// Replace any existing table with a 2-D table over `[low_x, high_x] x [low_y, high_y]`.
    pub fn linearize_2d(
        &mut self,
        (low_x, high_x): (f64, f64),
        (low_y, high_y): (f64, f64),
        (steps_x, steps_y): (usize, usize),
    ) -> ExpressionResult<()> {
        self.linearization = None;
        let x_axis = Axis::new(low_x, high_x, steps_x)?;
        let y_axis = Axis::new(low_y, high_y, steps_y)?;
        if Table2d::node_count(&x_axis, &y_axis).is_none() {
            return Err(ExpressionError::InvalidDomain {
                low: low_y,
                high: high_y,
                steps: steps_y,
            });
        }
        let table = Table2d::build(x_axis, y_axis, |x, y| self.evaluate_forced(x, y))?;
        log::debug!(
            "linearized '{}' over [{low_x}, {high_x}] x [{low_y}, {high_y}] with {} node(s)",
            self.source,
            x_axis.nodes() * y_axis.nodes()
        );
        self.linearization = Some(Linearization::TwoD(table));
        Ok(())
    }

    /// Build a 1-D table if `settings` enable linearization. Returns whether a table was built.
    pub fn linearize_with(
        &mut self,
        settings: &ExpressionSettings,
        low: f64,
        high: f64,
    ) -> ExpressionResult<bool> {
        if !settings.linearization_enabled {
            return Ok(false);
        }
        self.linearize(low, high, settings.linearization_steps)?;
        Ok(true)
    }

    /// 2-D counterpart of [`Expression::linearize_with`].
    pub fn linearize_2d_with(
        &mut self,
        settings: &ExpressionSettings,
        x: (f64, f64),
        y: (f64, f64),
    ) -> ExpressionResult<bool> {
        if !settings.linearization_enabled {
            return Ok(false);
        }
        self.linearize_2d(x, y, settings.linearization_steps_2d)?;
        Ok(true)
    }

    pub fn linearization(&self) -> Option<&Linearization> {
        self.linearization.as_ref()
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_parsed(&self) -> bool {
        self.program.is_some()
    }

    /// True if the text is blank or compiled to no instructions.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() || self.program.as_ref().is_some_and(Program::is_empty)
    }

    /// True once compiled, if no variable is referenced.
    pub fn is_constant(&self) -> bool {
        self.program.as_ref().is_some_and(Program::is_constant)
    }

    pub fn is_strict(&self) -> bool {
        self.binding == Binding::Strict
    }

    /// Choose the binding mode for the next compilation.
    pub fn set_strict(&mut self, strict: bool) {
        self.binding = if strict { Binding::Strict } else { Binding::Lax };
    }
}

impl From<&str> for Expression {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for Expression {
    /// The compiled instruction listing, or the source text before compilation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.program {
            Some(program) => fmt::Display::fmt(program, f),
            None => f.write_str(&self.source),
        }
    }
}
