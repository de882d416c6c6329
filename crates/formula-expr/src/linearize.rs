//! Piecewise-linear lookup tables standing in for direct evaluation.
//!
//! A table samples a function at `steps + 2` equidistant nodes per axis: the regular
//! `steps + 1` nodes covering `[low, high]` plus one node past `high`, so a lookup at exactly
//! `high` still has a right neighbour. Lookups outside the domain return `None`; callers then
//! run the expression directly. Tables never extrapolate.

use crate::error::ExpressionError;

/// Upper bound on sampled nodes per table, across all axes.
pub const MAX_TABLE_NODES: usize = 4_000_000;

/// One sampled dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Axis {
    low: f64,
    high: f64,
    step: f64,
    steps: usize,
}

impl Axis {
    pub fn new(low: f64, high: f64, steps: usize) -> Result<Self, ExpressionError> {
        let too_many = steps
            .checked_add(2)
            .map_or(true, |nodes| nodes > MAX_TABLE_NODES);
        if steps == 0 || too_many || !low.is_finite() || !high.is_finite() || low >= high {
            return Err(ExpressionError::InvalidDomain { low, high, steps });
        }
        Ok(Self {
            low,
            high,
            step: (high - low) / steps as f64,
            steps,
        })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of sampled nodes (`steps + 2`).
    pub fn nodes(&self) -> usize {
        self.steps + 2
    }

    fn node(&self, index: usize) -> f64 {
        self.low + index as f64 * self.step
    }

    fn contains(&self, x: f64) -> bool {
        x >= self.low && x <= self.high
    }

    /// Index of the node at or left of `x`; `x` must be inside the domain.
    fn cell(&self, x: f64) -> usize {
        // Rounding can push `x == high` one cell too far; the last usable cell is `steps`.
        (((x - self.low) / self.step) as usize).min(self.steps)
    }
}

/// 1-D table: linear interpolation between the two bracketing nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Table1d {
    axis: Axis,
    values: Vec<f64>,
}

impl Table1d {
    pub fn build<E>(axis: Axis, mut f: impl FnMut(f64) -> Result<f64, E>) -> Result<Self, E> {
        let values = (0..axis.nodes())
            .map(|i| f(axis.node(i)))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Self { axis, values })
    }

    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    pub fn lookup(&self, x: f64) -> Option<f64> {
        if !self.axis.contains(x) {
            return None;
        }
        let i = self.axis.cell(x);
        let (left, right) = (self.values[i], self.values[i + 1]);
        Some(left + (right - left) / self.axis.step * (x - self.axis.node(i)))
    }
}

/// 2-D table, stored x-major (`index = nodes_y * ix + iy`).
///
/// Interpolation uses the average of the two finite-difference slopes along each axis of the
/// enclosing cell rather than an exact bilinear form. The slope along x is divided by the y step
/// and the slope along y by the x step; the two coincide on square grids. Existing calibrations
/// depend on these values, so the approximation is kept as is.
#[derive(Clone, Debug, PartialEq)]
pub struct Table2d {
    x: Axis,
    y: Axis,
    values: Vec<f64>,
}

impl Table2d {
    /// Node count of a table over `x` and `y`, or `None` above [`MAX_TABLE_NODES`].
    pub fn node_count(x: &Axis, y: &Axis) -> Option<usize> {
        x.nodes()
            .checked_mul(y.nodes())
            .filter(|&nodes| nodes <= MAX_TABLE_NODES)
    }

    pub fn build<E>(
        x: Axis,
        y: Axis,
        mut f: impl FnMut(f64, f64) -> Result<f64, E>,
    ) -> Result<Self, E> {
        let mut values = Vec::with_capacity(x.nodes() * y.nodes());
        for ix in 0..x.nodes() {
            for iy in 0..y.nodes() {
                values.push(f(x.node(ix), y.node(iy))?);
            }
        }
        Ok(Self { x, y, values })
    }

    pub fn axes(&self) -> (&Axis, &Axis) {
        (&self.x, &self.y)
    }

    pub fn lookup(&self, x: f64, y: f64) -> Option<f64> {
        if !self.x.contains(x) || !self.y.contains(y) {
            return None;
        }
        let (ix, iy) = (self.x.cell(x), self.y.cell(y));
        let sy = self.y.nodes();
        let i = sy * ix + iy;
        let d = &self.values;

        let slope_x =
            ((d[i + sy] - d[i]) / self.y.step + (d[i + sy + 1] - d[i + 1]) / self.y.step) / 2.0;
        let slope_y =
            ((d[i + 1] - d[i]) / self.x.step + (d[i + sy + 1] - d[i + sy]) / self.x.step) / 2.0;
        Some(d[i] + (x - self.x.node(ix)) * slope_x + (y - self.y.node(iy)) * slope_y)
    }
}

/// Table attached to an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Linearization {
    OneD(Table1d),
    TwoD(Table2d),
}

impl Linearization {
    pub fn dimensions(&self) -> usize {
        match self {
            Linearization::OneD(_) => 1,
            Linearization::TwoD(_) => 2,
        }
    }

    /// Interpolated value, or `None` when `(x, y)` lies outside the table. `y` is ignored by
    /// 1-D tables.
    pub fn lookup(&self, x: f64, y: f64) -> Option<f64> {
        match self {
            Linearization::OneD(table) => table.lookup(x),
            Linearization::TwoD(table) => table.lookup(x, y),
        }
    }
}
