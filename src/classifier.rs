//! Risk classification from fraud scores.
//!
//! The classifier is a pure function: identical scores always yield the
//! identical level, which keeps dashboards and tests reproducible.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FraudError;

/// Discrete risk bucket derived from a fraud score.
///
/// Ordering follows severity: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Parse an exact status string. Unknown values are a validation error,
    /// never a silent fallback.
    pub fn parse(value: &str) -> Result<Self, FraudError> {
        match value {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            other => Err(FraudError::Validation(format!(
                "unknown risk level '{other}' (expected LOW, MEDIUM, HIGH or CRITICAL)"
            ))),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a fraud score onto a discrete risk level.
///
/// Bucket boundaries: `< 0.3` low, `< 0.5` medium, `< 0.7` high,
/// `>= 0.7` critical. Fails with `InvalidScore` for anything outside
/// `[0, 1]` or non-finite.
pub fn classify(score: f64) -> Result<RiskLevel, FraudError> {
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(FraudError::InvalidScore { score });
    }
    Ok(if score >= 0.7 {
        RiskLevel::Critical
    } else if score >= 0.5 {
        RiskLevel::High
    } else if score >= 0.3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    })
}
