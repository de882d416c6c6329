//! Fast paths for two fixed formula shapes used by tree species parameters.
//!
//! Species files carry these formulas as text, but they are evaluated per tree per year, so
//! instead of running them through the general compiler their coefficients are extracted once
//! and the closed form is evaluated in `f32` directly. Text that does not match the shape is
//! rejected with a [`SpecializedFormError`](crate::SpecializedFormError); hosts can then fall
//! back to a general [`Expression`](crate::Expression).

mod aging;
mod height_diameter;

pub use aging::AgingCurve;
pub use height_diameter::HeightDiameterRatioBound;

/// Parse a coefficient, tolerating surrounding whitespace and whitespace after a sign
/// (`"- 0.28"`).
fn parse_coefficient(text: &str) -> Option<f32> {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, text[1..].trim_start()),
        Some(b'+') => (false, text[1..].trim_start()),
        _ => (false, text),
    };
    let value: f32 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::parse_coefficient;
    use pretty_assertions::assert_eq;

    #[test]
    fn coefficients() {
        assert_eq!(parse_coefficient(" 110"), Some(110.0));
        assert_eq!(parse_coefficient("-0.2834"), Some(-0.2834));
        assert_eq!(parse_coefficient("+ 1 "), Some(1.0));
        assert_eq!(parse_coefficient("- 2.5"), Some(-2.5));
        assert_eq!(parse_coefficient("d"), None);
        assert_eq!(parse_coefficient(""), None);
    }
}
