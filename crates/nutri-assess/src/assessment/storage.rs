//! Row shape used by table-backed stores. Scalars live in their own columns and every
//! answer set is kept as a JSON text column, so a row can be written to and read
//! from a relational table without knowing the questionnaire schema.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::domain::{AssessmentId, Gender, PersonalInfo};
use super::repository::{AssessmentRecord, AssessmentStatus};
use super::scoring::{Bmi, NutritionScores, Recommendations, StressLevel};
use crate::auth::UserId;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to encode {column}: {source}")]
    Encode {
        column: &'static str,
        source: serde_json::Error,
    },
    #[error("failed to decode {column}: {source}")]
    Decode {
        column: &'static str,
        source: serde_json::Error,
    },
    #[error("unexpected value '{value}' in {column}")]
    UnknownValue { column: &'static str, value: String },
}

/// Flat persisted representation of an [`AssessmentRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRow {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub revision: u64,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub year_of_study: Option<u8>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    pub faculty: Option<String>,
    pub personal_data: Option<String>,
    pub consumption_score: Option<u8>,
    pub consumption_data: Option<String>,
    pub nutrition_knowledge_score: Option<u8>,
    pub nutrition_skills_score: Option<u8>,
    pub nutrition_perception_score: Option<u8>,
    pub nutrition_data: Option<String>,
    pub stress_score: Option<u8>,
    pub stress_level: Option<String>,
    pub stress_data: Option<String>,
    pub recommendations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Serializes an answer set into its text column form.
pub fn encode_section<T: Serialize>(
    column: &'static str,
    value: &T,
) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Encode { column, source })
}

pub fn decode_section<T: DeserializeOwned>(
    column: &'static str,
    raw: &str,
) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|source| StorageError::Decode { column, source })
}

fn encode_optional<T: Serialize>(
    column: &'static str,
    value: Option<&T>,
) -> Result<Option<String>, StorageError> {
    value.map(|value| encode_section(column, value)).transpose()
}

fn decode_optional<T: DeserializeOwned>(
    column: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, StorageError> {
    raw.map(|raw| decode_section(column, raw)).transpose()
}

impl TryFrom<&AssessmentRecord> for AssessmentRow {
    type Error = StorageError;

    fn try_from(record: &AssessmentRecord) -> Result<Self, Self::Error> {
        let personal = record.personal_info.as_ref();
        let nutrition_scores = record.nutrition_scores;

        Ok(Self {
            id: record.id.0.clone(),
            user_id: record.owner.0.clone(),
            status: record.status.label().to_string(),
            revision: record.revision,
            age: personal.map(|info| info.age),
            gender: personal.map(|info| info.gender),
            year_of_study: personal.map(|info| info.year_of_study),
            height: personal.map(|info| info.height_cm),
            weight: personal.map(|info| info.weight_kg),
            bmi: record.bmi.map(Bmi::value),
            faculty: personal
                .map(|info| info.major.clone().unwrap_or_else(|| info.faculty.clone())),
            personal_data: encode_optional("personal_data", personal)?,
            consumption_score: record.consumption_score,
            consumption_data: encode_optional("consumption_data", record.consumption.as_ref())?,
            nutrition_knowledge_score: nutrition_scores.map(|scores| scores.knowledge),
            nutrition_skills_score: nutrition_scores.map(|scores| scores.skills),
            nutrition_perception_score: nutrition_scores.map(|scores| scores.perception),
            nutrition_data: encode_optional("nutrition_data", record.nutrition.as_ref())?,
            stress_score: record.stress_score,
            stress_level: record.stress_level.map(|level| level.label().to_string()),
            stress_data: encode_optional("stress_data", record.stress.as_ref())?,
            recommendations: record.recommendations.as_ref().map(Recommendations::text),
            created_at: record.created_at,
            updated_at: record.updated_at,
            completed_at: record.completed_at,
        })
    }
}

impl TryFrom<AssessmentRow> for AssessmentRecord {
    type Error = StorageError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        let status = AssessmentStatus::from_label(&row.status).ok_or_else(|| {
            StorageError::UnknownValue {
                column: "status",
                value: row.status.clone(),
            }
        })?;

        let stress_level = row
            .stress_level
            .as_deref()
            .map(|label| {
                StressLevel::from_label(label).ok_or_else(|| StorageError::UnknownValue {
                    column: "stress_level",
                    value: label.to_string(),
                })
            })
            .transpose()?;

        let bmi = row
            .bmi
            .map(|value| {
                Bmi::from_stored(value).map_err(|_| StorageError::UnknownValue {
                    column: "bmi",
                    value: value.to_string(),
                })
            })
            .transpose()?;

        let nutrition_scores = match (
            row.nutrition_knowledge_score,
            row.nutrition_skills_score,
            row.nutrition_perception_score,
        ) {
            (Some(knowledge), Some(skills), Some(perception)) => Some(NutritionScores {
                knowledge,
                skills,
                perception,
            }),
            _ => None,
        };

        let personal_info: Option<PersonalInfo> =
            decode_optional("personal_data", row.personal_data.as_deref())?;

        Ok(Self {
            id: AssessmentId(row.id),
            owner: UserId(row.user_id),
            status,
            revision: row.revision,
            personal_info,
            bmi,
            consumption: decode_optional("consumption_data", row.consumption_data.as_deref())?,
            consumption_score: row.consumption_score,
            nutrition: decode_optional("nutrition_data", row.nutrition_data.as_deref())?,
            nutrition_scores,
            stress: decode_optional("stress_data", row.stress_data.as_deref())?,
            stress_score: row.stress_score,
            stress_level,
            recommendations: row.recommendations.as_deref().map(Recommendations::from_text),
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}
