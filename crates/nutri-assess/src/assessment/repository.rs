use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AssessmentId, ConsumptionAnswers, NutritionAnswers, PersonalInfo, StressAnswers,
};
use super::scoring::{Bmi, BmiCategory, NutritionScores, Recommendations, StressLevel};
use super::storage::StorageError;
use crate::auth::UserId;

/// Lifecycle of an assessment. Each owner has at most one active record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Active,
    Completed,
}

impl AssessmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssessmentStatus::Active => "active",
            AssessmentStatus::Completed => "completed",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "active" => Some(AssessmentStatus::Active),
            "completed" => Some(AssessmentStatus::Completed),
            _ => None,
        }
    }
}

/// One owner's answers, derived scores, and advice across a single completion cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: AssessmentId,
    pub owner: UserId,
    pub status: AssessmentStatus,
    /// Bumped by the repository on every successful update.
    pub revision: u64,
    pub personal_info: Option<PersonalInfo>,
    pub bmi: Option<Bmi>,
    pub consumption: Option<ConsumptionAnswers>,
    pub consumption_score: Option<u8>,
    pub nutrition: Option<NutritionAnswers>,
    pub nutrition_scores: Option<NutritionScores>,
    pub stress: Option<StressAnswers>,
    pub stress_score: Option<u8>,
    pub stress_level: Option<StressLevel>,
    pub recommendations: Option<Recommendations>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AssessmentRecord {
    pub fn new(id: AssessmentId, owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            status: AssessmentStatus::Active,
            revision: 0,
            personal_info: None,
            bmi: None,
            consumption: None,
            consumption_score: None,
            nutrition: None,
            nutrition_scores: None,
            stress: None,
            stress_score: None,
            stress_level: None,
            recommendations: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AssessmentStatus::Completed
    }

    pub fn summary(&self) -> AssessmentSummary {
        AssessmentSummary {
            assessment_id: self.id.clone(),
            status: self.status,
            age: self.personal_info.as_ref().map(|info| info.age),
            bmi: self.bmi.map(Bmi::value),
            bmi_category: self.bmi.map(Bmi::category),
            consumption_score: self.consumption_score,
            nutrition_knowledge_score: self.nutrition_scores.map(|scores| scores.knowledge),
            nutrition_skills_score: self.nutrition_scores.map(|scores| scores.skills),
            nutrition_perception_score: self.nutrition_scores.map(|scores| scores.perception),
            stress_score: self.stress_score,
            stress_level: self.stress_level,
            recommendations: self
                .recommendations
                .as_ref()
                .map(|advice| advice.lines().to_vec())
                .unwrap_or_default(),
            completed_at: self.completed_at,
        }
    }
}

/// Storage abstraction for assessment records.
///
/// Implementations must reject a second active record for the same owner and must
/// reject updates whose `revision` no longer matches the stored one.
pub trait AssessmentRepository: Send + Sync {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError>;
    /// Returns the stored record with its revision bumped.
    fn update(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError>;
    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError>;
    /// Most recently created record regardless of status.
    fn latest_for_owner(&self, owner: &UserId)
        -> Result<Option<AssessmentRecord>, RepositoryError>;
    /// Most recently completed record.
    fn latest_completed_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("owner already has an assessment in progress")]
    ActiveAssessmentExists,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (expected revision {expected}, found {found})")]
    StaleRevision { expected: u64, found: u64 },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Scores and advice as exposed to API clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentSummary {
    pub assessment_id: AssessmentId,
    pub status: AssessmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
    pub consumption_score: Option<u8>,
    pub nutrition_knowledge_score: Option<u8>,
    pub nutrition_skills_score: Option<u8>,
    pub nutrition_perception_score: Option<u8>,
    pub stress_score: Option<u8>,
    pub stress_level: Option<StressLevel>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
