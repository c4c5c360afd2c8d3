//! Pure scoring pipeline: section scorers, category classifiers, and the
//! recommendation composer. Nothing here performs I/O; inputs are validated answer
//! sets and the outputs are deterministic.

mod bmi;
mod classify;
mod recommendations;
mod rules;

pub use bmi::Bmi;
pub use classify::{BmiCategory, StressLevel};
pub use recommendations::{compose as compose_recommendations, Recommendations};
pub use recommendations::STRESS_ADVICE_THRESHOLD;
pub use rules::{
    consumption_score, knowledge_score, nutrition_scores, placeholder_score, stress_score,
    NutritionScores, MAX_STRESS_SCORE, PLACEHOLDER_SCORE,
};
