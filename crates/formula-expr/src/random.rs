//! Random number capability consumed by `rnd(low, high)` and `rndg(mean, std_dev)`.

use rand::Rng;
use std::cell::RefCell;

/// A source of random draws.
///
/// Draws take `&self` because accessors hand the source out by shared reference while an
/// expression is running; implementations keep their generator state behind interior
/// mutability, which also keeps them off other threads.
pub trait RandomSource {
    /// Uniform draw from `[low, high]`.
    fn uniform(&self, low: f64, high: f64) -> f64;

    /// Draw from a normal distribution.
    fn normal(&self, mean: f64, std_dev: f64) -> f64;
}

/// [`RandomSource`] over any `rand` generator.
#[derive(Debug)]
pub struct SharedRng<R> {
    rng: RefCell<R>,
}

impl<R: Rng> SharedRng<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: RefCell::new(rng),
        }
    }

    /// Give back the generator, e.g. to persist its state between runs.
    pub fn into_inner(self) -> R {
        self.rng.into_inner()
    }
}

impl<R: Rng> RandomSource for SharedRng<R> {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        let p: f64 = self.rng.borrow_mut().gen();
        low + (high - low) * p
    }

    fn normal(&self, mean: f64, std_dev: f64) -> f64 {
        // Polar form of the Box-Muller transform.
        let mut rng = self.rng.borrow_mut();
        let (x, r) = loop {
            let x = 2.0 * rng.gen::<f64>() - 1.0;
            let y = 2.0 * rng.gen::<f64>() - 1.0;
            let r = x * x + y * y;
            if r < 1.0 && r != 0.0 {
                break (x, r);
            }
        };
        let s = (-2.0 * r.ln() / r).sqrt();
        mean + x * s * std_dev
    }
}
