//! Variable binding between host model objects and expressions.
//!
//! The parser never knows host attribute names in advance. It asks the bound
//! [`VariableAccessor`] for its ordered name list, encodes a hit as an accessor slot, and the
//! VM later asks the accessor for the value at that slot. Every accessor starts its name list
//! with the shared base variable `"year"` (see [`BaseVariables`]).

use crate::error::EvalError;
use crate::random::RandomSource;
use std::cell::Cell;

/// Exposes named numeric attributes of a host object.
pub trait VariableAccessor {
    /// Ordered variable names; the position of a name is its index. The first entry is always
    /// `"year"`.
    fn variable_names(&self) -> Vec<&str>;

    fn value(&self, index: usize) -> Result<f64, EvalError>;

    /// Random source used by `rnd` and `rndg`, if the host provides one.
    fn random_source(&self) -> Option<&dyn RandomSource> {
        None
    }

    fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_names().iter().position(|n| *n == name)
    }

    fn value_by_name(&self, name: &str) -> Result<f64, EvalError> {
        match self.variable_index(name) {
            Some(index) => self.value(index),
            None => Err(EvalError::UnknownVariableName {
                name: name.to_string(),
            }),
        }
    }
}

/// "Current simulation time" context answering the `year` variable.
pub trait SimulationTime {
    fn current_year(&self) -> i32;
}

impl SimulationTime for i32 {
    fn current_year(&self) -> i32 {
        *self
    }
}

impl SimulationTime for Cell<i32> {
    fn current_year(&self) -> i32 {
        self.get()
    }
}

/// The shared part of every accessor: the `year` variable and the optional random source.
///
/// Concrete accessors embed this, list [`BaseVariables::NAMES`] first and delegate indices
/// below [`BaseVariables::COUNT`] to [`BaseVariables::value`].
#[derive(Clone, Copy, Default)]
pub struct BaseVariables<'a> {
    time: Option<&'a dyn SimulationTime>,
    random: Option<&'a dyn RandomSource>,
}

impl<'a> BaseVariables<'a> {
    pub const NAMES: [&'static str; 1] = ["year"];
    pub const COUNT: usize = Self::NAMES.len();

    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_time(mut self, time: &'a dyn SimulationTime) -> Self {
        self.time = Some(time);
        self
    }

    #[must_use]
    pub fn with_random(mut self, random: &'a dyn RandomSource) -> Self {
        self.random = Some(random);
        self
    }

    pub fn random_source(&self) -> Option<&'a dyn RandomSource> {
        self.random
    }

    pub fn value(&self, index: usize) -> Result<f64, EvalError> {
        match index {
            0 => self
                .time
                .map(|t| f64::from(t.current_year()))
                .ok_or(EvalError::NoSimulationTime),
            _ => Err(EvalError::UnknownVariableIndex { index }),
        }
    }
}

impl std::fmt::Debug for BaseVariables<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseVariables")
            .field("time", &self.time.map(|t| t.current_year()))
            .field("random", &self.random.is_some())
            .finish()
    }
}

/// General-purpose accessor over name/value pairs, for hosts without a dedicated record type.
#[derive(Debug, Clone, Default)]
pub struct NamedValues<'a> {
    base: BaseVariables<'a>,
    names: Vec<String>,
    values: Vec<f64>,
}

impl<'a> NamedValues<'a> {
    pub fn new(base: BaseVariables<'a>) -> Self {
        Self {
            base,
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name`, appending it if new. Returns the accessor index of the variable.
    pub fn set(&mut self, name: &str, value: f64) -> usize {
        match self.names.iter().position(|n| n == name) {
            Some(pos) => {
                self.values[pos] = value;
                pos + BaseVariables::COUNT
            }
            None => {
                self.names.push(name.to_string());
                self.values.push(value);
                self.names.len() - 1 + BaseVariables::COUNT
            }
        }
    }

    /// Update by accessor index, e.g. when iterating records with a fixed layout.
    pub fn set_at(&mut self, index: usize, value: f64) -> Result<(), EvalError> {
        let slot = index
            .checked_sub(BaseVariables::COUNT)
            .and_then(|i| self.values.get_mut(i))
            .ok_or(EvalError::UnknownVariableIndex { index })?;
        *slot = value;
        Ok(())
    }
}

impl VariableAccessor for NamedValues<'_> {
    fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BaseVariables::NAMES.to_vec();
        names.extend(self.names.iter().map(String::as_str));
        names
    }

    fn value(&self, index: usize) -> Result<f64, EvalError> {
        if index < BaseVariables::COUNT {
            return self.base.value(index);
        }
        self.values
            .get(index - BaseVariables::COUNT)
            .copied()
            .ok_or(EvalError::UnknownVariableIndex { index })
    }

    fn random_source(&self) -> Option<&dyn RandomSource> {
        self.base.random_source()
    }
}
