//! Score block: the scoring collaborator's output for one record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `overall` assigned when scoring a record failed.
pub const FALLBACK_OVERALL: f64 = 50.0;

/// Quality label assigned when scoring a record failed.
pub const FALLBACK_QUALITY: &str = "unknown";

/// Structured score. Only `overall` is read by the ranking engine; the rest
/// is carried through for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBlock {
    /// Normalized score in `0.0..=100.0`.
    pub overall: f64,

    pub quality: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,

    /// Set when this block is a fallback for a failed scoring call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreBlock {
    /// Build a block, clamping `overall` into range. A non-finite score is
    /// not a score at all and yields a fallback block.
    pub fn new(overall: f64, quality: impl Into<String>, details: Value) -> Self {
        if !overall.is_finite() {
            return Self::fallback(format!("non-finite overall score: {overall}"));
        }
        Self {
            overall: overall.clamp(0.0, 100.0),
            quality: quality.into(),
            details,
            error: None,
        }
    }

    /// Degraded block used in place of a failed scoring call.
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            overall: FALLBACK_OVERALL,
            quality: FALLBACK_QUALITY.to_string(),
            details: Value::Null,
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::in_range(72.5, 72.5)]
    #[case::above(130.0, 100.0)]
    #[case::below(-4.0, 0.0)]
    fn overall_is_clamped(#[case] raw: f64, #[case] expected: f64) {
        let block = ScoreBlock::new(raw, "Good", Value::Null);
        assert_eq!(block.overall, expected);
        assert!(!block.is_degraded());
    }

    #[test]
    fn nan_becomes_fallback() {
        let block = ScoreBlock::new(f64::NAN, "Good", Value::Null);
        assert!(block.is_degraded());
        assert_eq!(block.overall, FALLBACK_OVERALL);
        assert_eq!(block.quality, FALLBACK_QUALITY);
    }

    #[test]
    fn fallback_carries_error() {
        let block = ScoreBlock::fallback("scorer offline");
        assert_eq!(block.overall, 50.0);
        assert_eq!(block.error.as_deref(), Some("scorer offline"));
    }
}
