use super::parse_coefficient;
use crate::error::{SpecializedFormError, SpecializedKind};
use std::str::FromStr;

/// Bounded height:diameter ratio `[min(] M * d ^ E [, bound)]`.
///
/// The multiplier may be a product of coefficients where any factor can be a parenthesized sum
/// or difference of two coefficients (`a0*a1*(a2-a3)`); the exponent may be a product of
/// coefficients, optionally in parentheses. Without a `min(...)` wrapper the bound is
/// `f32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightDiameterRatioBound {
    multiplier: f32,
    exponent: f32,
    upper_bound: f32,
}

impl HeightDiameterRatioBound {
    pub fn parse(&mut self, expression: &str) -> Result<(), SpecializedFormError> {
        *self = Self::parse_form(expression).ok_or_else(|| {
            SpecializedFormError::new(SpecializedKind::HeightDiameterRatio, expression)
        })?;
        Ok(())
    }

    fn parse_form(expression: &str) -> Option<Self> {
        let (body, upper_bound) = match expression.strip_prefix("min(") {
            Some(rest) => {
                let (body, bound) = rest.strip_suffix(')')?.rsplit_once(',')?;
                (body, parse_coefficient(bound)?)
            }
            None => (expression, f32::MAX),
        };

        let (base, exponent) = body.rsplit_once('^')?;
        let d = base.rfind('d')?;
        let (multiplier, _) = base[..d].rsplit_once('*')?;

        let multiplier = multiplier
            .split('*')
            .map(multiplier_factor)
            .product::<Option<f32>>()?;

        let exponent = match exponent.find('(') {
            Some(open) => {
                let inner = &exponent[open + 1..];
                &inner[..inner.rfind(')')?]
            }
            None => exponent,
        };
        let exponent = exponent
            .split('*')
            .map(parse_coefficient)
            .product::<Option<f32>>()?;

        Some(Self {
            multiplier,
            exponent,
            upper_bound,
        })
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn exponent(&self) -> f32 {
        self.exponent
    }

    pub fn upper_bound(&self) -> f32 {
        self.upper_bound
    }

    /// `min(multiplier * dbh^exponent, upper_bound)`.
    pub fn evaluate(&self, dbh: f32) -> f32 {
        let ratio = self.multiplier * dbh.powf(self.exponent);
        if ratio < self.upper_bound {
            ratio
        } else {
            self.upper_bound
        }
    }
}

/// One factor of the multiplier: a coefficient, or `(a-b)` / `(a+b)`.
fn multiplier_factor(term: &str) -> Option<f32> {
    let Some(open) = term.find('(') else {
        return parse_coefficient(term);
    };
    let inner = &term[open + 1..];
    let inner = inner[..inner.find(')')?].trim();
    // A `-` at position 0 is the sign of the first summand.
    let split = match inner.rfind('-') {
        Some(pos) if pos > 0 => pos,
        _ => inner.rfind('+')?,
    };
    Some(parse_coefficient(&inner[..split])? + parse_coefficient(&inner[split..])?)
}

impl Default for HeightDiameterRatioBound {
    /// Unbounded `1 * d^1`.
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            exponent: 1.0,
            upper_bound: f32::MAX,
        }
    }
}

impl FromStr for HeightDiameterRatioBound {
    type Err = SpecializedFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bound = Self::default();
        bound.parse(s)?;
        Ok(bound)
    }
}
