use crate::error::{ExpressionError, ExpressionResult};
use serde::{Deserialize, Serialize};

/// Project-wide switches for expression evaluation.
///
/// Missing fields fall back to their defaults when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionSettings {
    /// Whether hosts should replace eligible expressions by lookup tables.
    ///
    /// Off by default: tables trade accuracy for speed and are only worth it for formulas
    /// evaluated very often over a known range.
    pub linearization_enabled: bool,
    /// Steps of 1-D tables.
    pub linearization_steps: usize,
    /// Steps along x and y of 2-D tables.
    pub linearization_steps_2d: (usize, usize),
}

impl Default for ExpressionSettings {
    fn default() -> Self {
        Self {
            linearization_enabled: false,
            linearization_steps: 1000,
            linearization_steps_2d: (50, 50),
        }
    }
}

impl ExpressionSettings {
    pub fn from_json(json: &str) -> ExpressionResult<Self> {
        serde_json::from_str(json).map_err(|err| ExpressionError::Settings(err.to_string()))
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        // Plain data without maps keyed by non-strings; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            ExpressionSettings::from_json(r#"{ "linearization_enabled": true }"#).unwrap();
        assert_eq!(
            settings,
            ExpressionSettings {
                linearization_enabled: true,
                ..ExpressionSettings::default()
            }
        );
    }

    #[test]
    fn steps_2d_is_a_pair() {
        let settings = ExpressionSettings::from_json(
            r#"{ "linearization_steps": 200, "linearization_steps_2d": [20, 40] }"#,
        )
        .unwrap();
        assert_eq!(settings.linearization_steps, 200);
        assert_eq!(settings.linearization_steps_2d, (20, 40));
        assert_eq!(ExpressionSettings::from_json(&settings.to_json()).unwrap(), settings);
    }

    #[test]
    fn malformed_json_is_a_settings_error() {
        let err = ExpressionSettings::from_json(r#"{ "linearization_steps": "many" }"#).unwrap_err();
        assert!(matches!(err, ExpressionError::Settings(_)), "{err:?}");
    }
}
