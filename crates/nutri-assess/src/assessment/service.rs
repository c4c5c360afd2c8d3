use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::domain::{
    AssessmentId, ConsumptionAnswers, ConsumptionDraft, NutritionAnswers, NutritionDraft,
    PersonalInfo, PersonalInfoDraft, StressAnswers, StressDraft,
};
use super::flow::{self, AssessmentProgress, AssessmentStep, OutOfOrder};
use super::repository::{
    AssessmentRecord, AssessmentRepository, AssessmentStatus, AssessmentSummary, RepositoryError,
};
use super::scoring::{
    compose_recommendations, consumption_score, nutrition_scores, stress_score, Bmi, StressLevel,
};
use super::validation::ValidationError;
use crate::auth::UserId;

/// Service walking a respondent through the questionnaire and persisting each page.
pub struct AssessmentService<R> {
    repository: Arc<R>,
    clock: fn() -> DateTime<Utc>,
}

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("asm-{id:06}"))
}

impl<R> AssessmentService<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            clock: Utc::now,
        }
    }

    /// Replaces the wall clock, mainly so tests can pin timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Records consent. Resumes the owner's active assessment if there is one,
    /// otherwise opens a fresh record.
    pub fn start(
        &self,
        owner: &UserId,
        consent: bool,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        if !consent {
            return Err(ValidationError::ConsentRequired.into());
        }

        if let Some(record) = self.repository.latest_for_owner(owner)? {
            if !record.is_completed() {
                debug!(assessment_id = %record.id.0, owner = %owner.0, "resuming assessment");
                return Ok(record);
            }
        }

        let record = AssessmentRecord::new(next_assessment_id(), owner.clone(), (self.clock)());
        let stored = self.repository.insert(record)?;
        info!(assessment_id = %stored.id.0, owner = %owner.0, "assessment started");
        Ok(stored)
    }

    pub fn progress(&self, owner: &UserId) -> Result<AssessmentProgress, AssessmentServiceError> {
        let record = self
            .repository
            .latest_for_owner(owner)?
            .ok_or(AssessmentServiceError::NoActiveAssessment)?;
        Ok(AssessmentProgress::of(&record))
    }

    pub fn submit_personal_info(
        &self,
        owner: &UserId,
        draft: PersonalInfoDraft,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let info = PersonalInfo::try_from(draft)?;
        let bmi = Bmi::calculate(info.height_cm, info.weight_kg)?;

        self.advance(owner, AssessmentStep::PersonalInfo, move |record, _| {
            record.personal_info = Some(info);
            record.bmi = Some(bmi);
            Ok(())
        })
    }

    pub fn submit_consumption(
        &self,
        owner: &UserId,
        draft: ConsumptionDraft,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let answers = ConsumptionAnswers::try_from(draft)?;
        let score = consumption_score(&answers);

        self.advance(owner, AssessmentStep::Consumption, move |record, _| {
            record.consumption = Some(answers);
            record.consumption_score = Some(score);
            Ok(())
        })
    }

    pub fn submit_nutrition(
        &self,
        owner: &UserId,
        draft: NutritionDraft,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let answers = NutritionAnswers::try_from(draft)?;
        let scores = nutrition_scores(&answers);

        self.advance(owner, AssessmentStep::NutritionKnowledge, move |record, _| {
            record.nutrition = Some(answers);
            record.nutrition_scores = Some(scores);
            Ok(())
        })
    }

    /// Saves the last page and seals the record with its level and advice.
    pub fn submit_stress(
        &self,
        owner: &UserId,
        draft: StressDraft,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let answers = StressAnswers::try_from(draft)?;
        let score = stress_score(&answers);
        let level = StressLevel::from_score(score);

        let sealed = self.advance(owner, AssessmentStep::Stress, move |record, now| {
            let bmi = record.bmi.ok_or(OutOfOrder {
                requested: AssessmentStep::Stress,
                required: AssessmentStep::PersonalInfo,
            })?;

            record.stress = Some(answers);
            record.stress_score = Some(score);
            record.stress_level = Some(level);
            record.recommendations = Some(compose_recommendations(bmi, score));
            record.status = AssessmentStatus::Completed;
            record.completed_at = Some(now);
            Ok(())
        })?;

        info!(
            assessment_id = %sealed.id.0,
            owner = %owner.0,
            stress_level = %level,
            "assessment completed"
        );
        Ok(sealed)
    }

    /// Latest completed assessment. Advice is regenerated and saved when missing.
    pub fn results(&self, owner: &UserId) -> Result<AssessmentSummary, AssessmentServiceError> {
        let mut record = self
            .repository
            .latest_completed_for_owner(owner)?
            .ok_or(AssessmentServiceError::NoCompletedAssessment)?;

        if record.recommendations.is_none() {
            if let (Some(bmi), Some(score)) = (record.bmi, record.stress_score) {
                record.recommendations = Some(compose_recommendations(bmi, score));
                record.updated_at = (self.clock)();
                record = self.repository.update(record)?;
                debug!(assessment_id = %record.id.0, "regenerated recommendations");
            }
        }

        Ok(record.summary())
    }

    /// Read, apply, and write back one page against the owner's active record. The
    /// write carries the revision that was read, so a concurrent submission surfaces
    /// as a stale revision instead of being overwritten.
    fn advance<F>(
        &self,
        owner: &UserId,
        step: AssessmentStep,
        apply: F,
    ) -> Result<AssessmentRecord, AssessmentServiceError>
    where
        F: FnOnce(&mut AssessmentRecord, DateTime<Utc>) -> Result<(), AssessmentServiceError>,
    {
        let mut record = self
            .repository
            .latest_for_owner(owner)?
            .filter(|record| !record.is_completed())
            .ok_or(AssessmentServiceError::NoActiveAssessment)?;

        flow::ensure_reachable(&record, step)?;

        let now = (self.clock)();
        apply(&mut record, now)?;
        record.updated_at = now;

        let stored = self.repository.update(record)?;
        debug!(
            assessment_id = %stored.id.0,
            step = %step,
            revision = stored.revision,
            "assessment step saved"
        );
        Ok(stored)
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    OutOfOrder(#[from] OutOfOrder),
    #[error("no assessment in progress; please start or restart the assessment")]
    NoActiveAssessment,
    #[error("no completed assessment found; please complete the assessment")]
    NoCompletedAssessment,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
