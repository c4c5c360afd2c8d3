use serde::{Deserialize, Serialize};

use super::bmi::Bmi;
use super::classify::BmiCategory;

const BULLET: &str = "• ";
const LINE_SEPARATOR: char = '\n';

/// Stress totals strictly above this value add the stress-specific advice.
pub const STRESS_ADVICE_THRESHOLD: u8 = 10;

const GAIN_WEIGHT: &str =
    "Eat more nutrient-dense food, focusing on protein and complex carbohydrates";
const REDUCE_WEIGHT: &str =
    "Control portion sizes, favour vegetables and fruit, and cut down on high-fat food";
const STRESS_MAGNESIUM: &str =
    "Eat more magnesium-rich food such as mung beans and dark leafy greens";
const STRESS_STIMULANTS: &str = "Avoid caffeine and alcohol in the evening";
const GENERAL_ADVICE: [&str; 3] = [
    "Drink enough water, at least 8 glasses a day",
    "Eat from all five food groups in suitable proportions",
    "Exercise regularly, at least 3 times a week",
];

/// Ordered advice lines. Rendered as bullet lines joined by newlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendations {
    lines: Vec<String>,
}

impl Recommendations {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn text(&self) -> String {
        self.lines.join(&LINE_SEPARATOR.to_string())
    }

    /// Parses text previously produced by [`Recommendations::text`].
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .split(LINE_SEPARATOR)
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Builds the advice for a finished assessment. Output depends only on the inputs.
pub fn compose(bmi: Bmi, stress_score: u8) -> Recommendations {
    let mut lines = Vec::with_capacity(6);

    match bmi.category() {
        BmiCategory::Underweight => lines.push(GAIN_WEIGHT),
        BmiCategory::Overweight | BmiCategory::Obese => lines.push(REDUCE_WEIGHT),
        BmiCategory::Normal => {}
    }

    if stress_score > STRESS_ADVICE_THRESHOLD {
        lines.push(STRESS_MAGNESIUM);
        lines.push(STRESS_STIMULANTS);
    }

    lines.extend(GENERAL_ADVICE);

    Recommendations {
        lines: lines
            .into_iter()
            .map(|line| format!("{BULLET}{line}"))
            .collect(),
    }
}
