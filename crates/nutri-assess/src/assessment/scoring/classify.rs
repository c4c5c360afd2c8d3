use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::MAX_STRESS_SCORE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

/// Exclusive upper bounds, ascending. Anything past the last bound is obese.
const BMI_UPPER_BOUNDS: [(f64, BmiCategory); 3] = [
    (18.5, BmiCategory::Underweight),
    (25.0, BmiCategory::Normal),
    (30.0, BmiCategory::Overweight),
];

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        BMI_UPPER_BOUNDS
            .iter()
            .find(|(upper, _)| bmi < *upper)
            .map(|(_, category)| *category)
            .unwrap_or(BmiCategory::Obese)
    }

    pub const fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "underweight",
            BmiCategory::Normal => "normal",
            BmiCategory::Overweight => "overweight",
            BmiCategory::Obese => "obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
    /// Only reachable for totals above [`MAX_STRESS_SCORE`], which valid answers never
    /// produce. Kept so out-of-band totals still classify.
    VeryHigh,
}

/// Inclusive upper bounds, ascending.
const STRESS_UPPER_BOUNDS: [(u8, StressLevel); 3] = [
    (5, StressLevel::Low),
    (10, StressLevel::Moderate),
    (MAX_STRESS_SCORE, StressLevel::High),
];

impl StressLevel {
    pub fn from_score(score: u8) -> Self {
        STRESS_UPPER_BOUNDS
            .iter()
            .find(|(upper, _)| score <= *upper)
            .map(|(_, level)| *level)
            .unwrap_or(StressLevel::VeryHigh)
    }

    pub const fn label(self) -> &'static str {
        match self {
            StressLevel::Low => "low",
            StressLevel::Moderate => "moderate",
            StressLevel::High => "high",
            StressLevel::VeryHigh => "very high",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            StressLevel::Low,
            StressLevel::Moderate,
            StressLevel::High,
            StressLevel::VeryHigh,
        ]
        .into_iter()
        .find(|level| level.label() == label)
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
