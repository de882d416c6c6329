use crate::error::{SpecializedFormError, SpecializedKind};
use std::str::FromStr;

/// Aging curve `1/(1 + (x/A)^B)`.
///
/// Stored as `multiplier = 1/A` and `exponent = B`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgingCurve {
    multiplier: f32,
    exponent: f32,
}

impl AgingCurve {
    const PREFIX: &'static str = "1/(1+(x/";

    /// Replace the coefficients with those of `expression`. Whitespace is ignored.
    pub fn parse(&mut self, expression: &str) -> Result<(), SpecializedFormError> {
        *self = Self::parse_form(expression)
            .ok_or_else(|| SpecializedFormError::new(SpecializedKind::Aging, expression))?;
        Ok(())
    }

    fn parse_form(expression: &str) -> Option<Self> {
        let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
        let rest = compact.strip_prefix(Self::PREFIX)?.strip_suffix(')')?;
        let (divisor, exponent) = rest.split_once(")^")?;
        let divisor: f32 = divisor.parse().ok()?;
        Some(Self {
            multiplier: 1.0 / divisor,
            exponent: exponent.parse().ok()?,
        })
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn exponent(&self) -> f32 {
        self.exponent
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        1.0 / (1.0 + (self.multiplier * x).powf(self.exponent))
    }
}

impl Default for AgingCurve {
    /// `1/(1 + (x/1)^1)`.
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            exponent: 1.0,
        }
    }
}

impl FromStr for AgingCurve {
    type Err = SpecializedFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut curve = Self::default();
        curve.parse(s)?;
        Ok(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_reciprocal_divisor_and_exponent() {
        let curve: AgingCurve = "1/(1 + (x/0.8)^2.05)".parse().unwrap();
        assert_eq!(curve.multiplier(), 1.0 / 0.8f32);
        assert_eq!(curve.exponent(), 2.05);
    }

    #[test]
    fn rejects_other_shapes() {
        for text in [
            "1/(1 + (y/0.8)^2)",
            "1/(1 + (x/0.8)^2",
            "2/(1 + (x/0.8)^2)",
            "1/(1 + (x/0.8)*2)",
            "1/(1 + (x/a)^2)",
        ] {
            let err = text.parse::<AgingCurve>().unwrap_err();
            assert_eq!(err.kind, SpecializedKind::Aging, "{text}");
            assert_eq!(err.expression, text);
        }
    }

    #[test]
    fn failed_parse_keeps_previous_coefficients() {
        let mut curve: AgingCurve = "1/(1+(x/0.5)^3)".parse().unwrap();
        assert!(curve.parse("garbage").is_err());
        assert_eq!(curve.exponent(), 3.0);
    }
}
