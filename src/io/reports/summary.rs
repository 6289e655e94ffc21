//! Summary counts derived from a verdict.

use serde::{Deserialize, Serialize};

use crate::core::model::QualityVerdict;

/// Success rate at or above which a run is rated excellent.
pub const EXCELLENT_THRESHOLD: f64 = 90.0;

/// Success rate at or above which a run is rated good.
pub const GOOD_THRESHOLD: f64 = 70.0;

/// Coarse rating of a success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateCategory {
    /// 90% and up
    Excellent,
    /// 70% up to 90%
    Good,
    /// Below 70%
    NeedsImprovement,
}

impl RateCategory {
    /// Rate a percentage
    pub fn from_rate(rate: f64) -> Self {
        if rate >= EXCELLENT_THRESHOLD {
            Self::Excellent
        } else if rate >= GOOD_THRESHOLD {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }

    /// Human label
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Counts over a verdict's conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Number of conditions
    pub total: usize,
    /// Conditions with status `OK`
    pub passed: usize,
    /// Conditions with any other status
    pub failed: usize,
    /// Failed conditions whose status is exactly `ERROR`
    pub errors: usize,
    /// Failed conditions on new-code metrics
    pub new_errors: usize,
    /// `passed / total * 100`, or 0 when there are no conditions
    pub success_rate: f64,
}

impl SummaryRecord {
    /// Count a verdict's conditions
    pub fn from_verdict(verdict: &QualityVerdict) -> Self {
        let conditions = verdict.conditions();
        let total = conditions.len();
        let failed = conditions.iter().filter(|c| !c.is_ok()).count();
        let new_errors = conditions
            .iter()
            .filter(|c| !c.is_ok() && c.is_new_code())
            .count();
        let errors = conditions.iter().filter(|c| c.status == "ERROR").count();
        let passed = total - failed;

        Self {
            total,
            passed,
            failed,
            errors,
            new_errors,
            success_rate: success_rate(passed, total),
        }
    }

    /// Rating of the success rate
    pub fn category(&self) -> RateCategory {
        RateCategory::from_rate(self.success_rate)
    }

    /// Named values for downstream pipeline steps
    pub fn named_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SONAR_RESULT_SUCCESS_RATE", format!("{:.2}", self.success_rate)),
            ("SONAR_RESULT_TOTAL", self.total.to_string()),
            ("SONAR_RESULT_PASSED", self.passed.to_string()),
            ("SONAR_RESULT_FAILED", self.failed.to_string()),
            ("SONAR_RESULT_ERRORS", self.errors.to_string()),
            ("SONAR_RESULT_NEW_ERRORS", self.new_errors.to_string()),
        ]
    }
}

fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    passed as f64 / total as f64 * 100.0
}
