//! Questionnaire answers, scoring, the page-by-page flow, and the persisted results a
//! respondent sees at the end.

pub mod batch;
pub mod domain;
pub mod flow;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod storage;
mod validation;

#[cfg(test)]
mod tests;

pub use batch::{score_respondents, write_scores, BatchError, RespondentScore};
pub use domain::{
    AssessmentId, ConsumptionAnswers, ConsumptionDraft, EnergyLevel, Frequency, Gender,
    KnowledgeAnswer, NutritionAnswers, NutritionDraft, PersonalInfo, PersonalInfoDraft,
    StressAnswers, StressDraft, StressRating, WeightPerception,
};
pub use flow::{AssessmentProgress, AssessmentStep, OutOfOrder};
pub use repository::{
    AssessmentRecord, AssessmentRepository, AssessmentStatus, AssessmentSummary, RepositoryError,
};
pub use router::assessment_router;
pub use service::{AssessmentService, AssessmentServiceError};
pub use storage::{AssessmentRow, StorageError};
pub use validation::ValidationError;
