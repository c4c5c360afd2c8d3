//! Offline re-scoring of questionnaire exports. Every row is scored independently; a
//! row with missing or invalid answers is reported alongside the others instead of
//! stopping the run.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{
    ConsumptionAnswers, ConsumptionDraft, EnergyLevel, FatHabitsDraft, Frequency,
    KnowledgeAnswer, KnowledgeDraft, NutritionAnswers, NutritionDraft, SodiumHabitsDraft,
    StressAnswers, StressDraft, StressRating, SweetHabitsDraft, WeightPerception,
    HEIGHT_SECTION, WEIGHT_SECTION,
};
use super::scoring::{
    compose_recommendations, consumption_score, nutrition_scores, stress_score, Bmi,
    BmiCategory, NutritionScores, Recommendations, StressLevel,
};
use super::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read respondent csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write scores: {0}")]
    Io(#[from] std::io::Error),
}

/// Scores derived for one exported respondent.
#[derive(Debug, Clone, PartialEq)]
pub struct RespondentScore {
    pub respondent_id: String,
    pub bmi: Option<Bmi>,
    pub consumption_score: Option<u8>,
    pub nutrition_scores: Option<NutritionScores>,
    pub stress_score: Option<u8>,
    pub stress_level: Option<StressLevel>,
    pub recommendations: Option<Recommendations>,
    pub unfinished_sections: Vec<&'static str>,
    pub issues: Vec<String>,
}

impl RespondentScore {
    fn new(respondent_id: String) -> Self {
        Self {
            respondent_id,
            bmi: None,
            consumption_score: None,
            nutrition_scores: None,
            stress_score: None,
            stress_level: None,
            recommendations: None,
            unfinished_sections: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.unfinished_sections.is_empty() && self.issues.is_empty()
    }

    fn absorb<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(ValidationError::Incomplete { sections }) => {
                self.unfinished_sections.extend(sections);
                None
            }
            Err(other) => {
                self.issues.push(other.to_string());
                None
            }
        }
    }
}

/// Parses a respondent export and scores each row.
pub fn score_respondents<R: Read>(reader: R) -> Result<Vec<RespondentScore>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut scores = Vec::new();

    for (index, record) in csv_reader.deserialize::<RespondentRow>().enumerate() {
        let score = match record {
            Ok(row) => score_row(row),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Deserialize { .. }) => {
                warn!(row = index + 1, error = %err, "skipping unreadable respondent row");
                let mut score = RespondentScore::new(format!("row-{}", index + 1));
                score.issues.push(err.to_string());
                score
            }
            Err(err) => return Err(err.into()),
        };
        scores.push(score);
    }

    debug!(respondents = scores.len(), "scored respondent export");
    Ok(scores)
}

/// Writes one CSV line per respondent with the derived scores.
pub fn write_scores<W: Write>(writer: W, scores: &[RespondentScore]) -> Result<(), BatchError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for score in scores {
        csv_writer.serialize(ScoreRow::from(score))?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn score_row(row: RespondentRow) -> RespondentScore {
    let mut score = RespondentScore::new(row.respondent_id.clone());

    let bmi = match (row.height_cm, row.weight_kg) {
        (Some(height), Some(weight)) => score.absorb(Bmi::calculate(height, weight)),
        (height, weight) => {
            if height.is_none() {
                score.unfinished_sections.push(HEIGHT_SECTION);
            }
            if weight.is_none() {
                score.unfinished_sections.push(WEIGHT_SECTION);
            }
            None
        }
    };
    score.bmi = bmi;

    let consumption = score.absorb(ConsumptionAnswers::try_from(row.consumption_draft()));
    score.consumption_score = consumption.as_ref().map(consumption_score);

    let nutrition = score.absorb(NutritionAnswers::try_from(row.nutrition_draft()));
    score.nutrition_scores = nutrition.as_ref().map(nutrition_scores);

    let stress = row.stress_draft().and_then(StressAnswers::try_from);
    if let Some(answers) = score.absorb(stress) {
        let total = stress_score(&answers);
        score.stress_score = Some(total);
        score.stress_level = Some(StressLevel::from_score(total));
    }

    if let (Some(bmi), Some(total)) = (score.bmi, score.stress_score) {
        score.recommendations = Some(compose_recommendations(bmi, total));
    }

    score
}

#[derive(Debug, Deserialize)]
struct RespondentRow {
    respondent_id: String,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    water: Option<Frequency>,
    soft_drinks: Option<Frequency>,
    fruit_juice: Option<Frequency>,
    desserts: Option<Frequency>,
    sugar_addition: Option<Frequency>,
    lean_meat: Option<Frequency>,
    fried_food: Option<Frequency>,
    high_fat_dishes: Option<Frequency>,
    sweet_drinks: Option<Frequency>,
    soup_gravy: Option<Frequency>,
    taste_before_season: Option<Frequency>,
    herbs_spices: Option<Frequency>,
    processed_meat: Option<Frequency>,
    instant_food: Option<Frequency>,
    pickled_food: Option<Frequency>,
    knowledge_1: Option<KnowledgeAnswer>,
    knowledge_2: Option<KnowledgeAnswer>,
    knowledge_3: Option<KnowledgeAnswer>,
    knowledge_4: Option<KnowledgeAnswer>,
    knowledge_5: Option<KnowledgeAnswer>,
    knowledge_6: Option<KnowledgeAnswer>,
    water_intake: Option<WeightPerception>,
    food_selection: Option<EnergyLevel>,
    stress_1: Option<u8>,
    stress_2: Option<u8>,
    stress_3: Option<u8>,
    stress_4: Option<u8>,
    stress_5: Option<u8>,
}

impl RespondentRow {
    fn consumption_draft(&self) -> ConsumptionDraft {
        ConsumptionDraft {
            sweet: SweetHabitsDraft {
                water: self.water,
                soft_drinks: self.soft_drinks,
                fruit_juice: self.fruit_juice,
                desserts: self.desserts,
                sugar_addition: self.sugar_addition,
            },
            fat: FatHabitsDraft {
                lean_meat: self.lean_meat,
                fried_food: self.fried_food,
                high_fat_dishes: self.high_fat_dishes,
                sweet_drinks: self.sweet_drinks,
                soup_gravy: self.soup_gravy,
            },
            sodium: SodiumHabitsDraft {
                taste_before_season: self.taste_before_season,
                herbs_spices: self.herbs_spices,
                processed_meat: self.processed_meat,
                instant_food: self.instant_food,
                pickled_food: self.pickled_food,
            },
        }
    }

    fn nutrition_draft(&self) -> NutritionDraft {
        NutritionDraft {
            knowledge: KnowledgeDraft {
                knowledge_1: self.knowledge_1,
                knowledge_2: self.knowledge_2,
                knowledge_3: self.knowledge_3,
                knowledge_4: self.knowledge_4,
                knowledge_5: self.knowledge_5,
                knowledge_6: self.knowledge_6,
            },
            water_intake: self.water_intake,
            food_selection: self.food_selection,
        }
    }

    /// Ratings above the scale are rejected before completeness is checked.
    fn stress_draft(&self) -> Result<StressDraft, ValidationError> {
        let rating = |value: Option<u8>| value.map(StressRating::new).transpose();
        Ok(StressDraft {
            stress_1: rating(self.stress_1)?,
            stress_2: rating(self.stress_2)?,
            stress_3: rating(self.stress_3)?,
            stress_4: rating(self.stress_4)?,
            stress_5: rating(self.stress_5)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ScoreRow<'a> {
    respondent_id: &'a str,
    bmi: Option<f64>,
    bmi_category: Option<BmiCategory>,
    consumption_score: Option<u8>,
    nutrition_knowledge_score: Option<u8>,
    nutrition_skills_score: Option<u8>,
    nutrition_perception_score: Option<u8>,
    stress_score: Option<u8>,
    stress_level: Option<&'static str>,
    recommendations: Option<String>,
    unfinished_sections: String,
    issues: String,
}

impl<'a> From<&'a RespondentScore> for ScoreRow<'a> {
    fn from(score: &'a RespondentScore) -> Self {
        Self {
            respondent_id: &score.respondent_id,
            bmi: score.bmi.map(Bmi::value),
            bmi_category: score.bmi.map(Bmi::category),
            consumption_score: score.consumption_score,
            nutrition_knowledge_score: score.nutrition_scores.map(|scores| scores.knowledge),
            nutrition_skills_score: score.nutrition_scores.map(|scores| scores.skills),
            nutrition_perception_score: score.nutrition_scores.map(|scores| scores.perception),
            stress_score: score.stress_score,
            stress_level: score.stress_level.map(StressLevel::label),
            recommendations: score.recommendations.as_ref().map(Recommendations::text),
            unfinished_sections: score.unfinished_sections.join("; "),
            issues: score.issues.join("; "),
        }
    }
}
