use super::super::domain::{
    ConsumptionAnswers, KnowledgeAnswer, KnowledgeAnswers, NutritionAnswers, StressAnswers,
};
use serde::{Deserialize, Serialize};

/// Score granted to a placeholder section as soon as it has any answer.
pub const PLACEHOLDER_SCORE: u8 = 50;

/// Highest attainable stress total: five questions rated at most 3.
pub const MAX_STRESS_SCORE: u8 = 15;

/// Rounds `100 * numerator / denominator` half-up without going through floats.
fn rounded_percentage(numerator: u32, denominator: u32) -> u8 {
    if denominator == 0 {
        return 0;
    }
    let percent = (200 * numerator + denominator) / (2 * denominator);
    percent.min(100) as u8
}

/// Weighted frequency score across all consumption questions, as a percentage of the
/// maximum weight.
pub fn consumption_score(answers: &ConsumptionAnswers) -> u8 {
    let (total_weight, question_count) = answers
        .frequencies()
        .fold((0u32, 0u32), |(weight, count), frequency| {
            (weight + frequency.weight(), count + 1)
        });

    rounded_percentage(total_weight, 3 * question_count)
}

/// Share of "yes" answers among the healthy weight practices.
pub fn knowledge_score(answers: &KnowledgeAnswers) -> u8 {
    let affirmative = answers
        .answers()
        .iter()
        .filter(|answer| **answer == KnowledgeAnswer::Yes)
        .count() as u32;

    rounded_percentage(affirmative, KnowledgeAnswers::QUESTION_COUNT as u32)
}

/// Flat rule: any answer is worth [`PLACEHOLDER_SCORE`], no answer is worth zero.
pub fn placeholder_score<T>(answer: Option<T>) -> u8 {
    if answer.is_some() {
        PLACEHOLDER_SCORE
    } else {
        0
    }
}

/// Sum of the five symptom ratings, bounded by [`MAX_STRESS_SCORE`].
pub fn stress_score(answers: &StressAnswers) -> u8 {
    answers
        .answers()
        .iter()
        .map(|rating| rating.value())
        .sum()
}

/// The three scores derived from the nutrition questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionScores {
    pub knowledge: u8,
    pub skills: u8,
    pub perception: u8,
}

pub fn nutrition_scores(answers: &NutritionAnswers) -> NutritionScores {
    NutritionScores {
        knowledge: knowledge_score(&answers.knowledge),
        skills: placeholder_score(Some(answers.water_intake)),
        perception: placeholder_score(Some(answers.food_selection)),
    }
}
