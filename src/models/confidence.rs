//! Confidence levels for dialect classification.

use serde::{Deserialize, Serialize};

/// Coarse confidence bucket for a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Most of the dialect's signature was present
    High,
    /// Partial signature, usually enough to parse
    #[default]
    Medium,
    /// Barely any signal; parsing is a guess
    Low,
}

impl Confidence {
    /// Bucket a confidence ratio in `[0, 1]`.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.6 {
            Confidence::High
        } else if ratio >= 0.3 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Returns true if confidence is high enough to parse without asking.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Confidence::High | Confidence::Medium)
    }

    /// Returns true if a human should double check the detected dialect.
    pub fn needs_review(&self) -> bool {
        matches!(self, Confidence::Low)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}
