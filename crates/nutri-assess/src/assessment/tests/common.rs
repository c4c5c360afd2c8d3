use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::assessment::domain::{
    AssessmentId, ConsumptionAnswers, ConsumptionDraft, EnergyLevel, FatHabits, Frequency,
    Gender, KnowledgeAnswer, KnowledgeAnswers, NutritionAnswers, NutritionDraft,
    PersonalInfoDraft, SodiumHabits, StressAnswers, StressDraft, StressRating, SweetHabits,
    WeightPerception,
};
use crate::assessment::repository::{
    AssessmentRecord, AssessmentRepository, AssessmentStatus, RepositoryError,
};
use crate::assessment::service::AssessmentService;
use crate::auth::UserId;

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn owner() -> UserId {
    UserId("user-0001".to_string())
}

pub(super) fn personal_info(height_cm: f64, weight_kg: f64) -> PersonalInfoDraft {
    PersonalInfoDraft {
        age: Some(20),
        gender: Some(Gender::Female),
        year_of_study: Some(2),
        height_cm: Some(height_cm),
        weight_kg: Some(weight_kg),
        faculty: Some("Science".to_string()),
        ..PersonalInfoDraft::default()
    }
}

pub(super) fn consumption_answers(frequency: Frequency) -> ConsumptionAnswers {
    ConsumptionAnswers {
        sweet: SweetHabits {
            water: frequency,
            soft_drinks: frequency,
            fruit_juice: frequency,
            desserts: frequency,
            sugar_addition: frequency,
        },
        fat: FatHabits {
            lean_meat: frequency,
            fried_food: frequency,
            high_fat_dishes: frequency,
            sweet_drinks: frequency,
            soup_gravy: frequency,
        },
        sodium: SodiumHabits {
            taste_before_season: frequency,
            herbs_spices: frequency,
            processed_meat: frequency,
            instant_food: frequency,
            pickled_food: frequency,
        },
    }
}

pub(super) fn consumption(frequency: Frequency) -> ConsumptionDraft {
    consumption_answers(frequency).into()
}

/// Knowledge answers with the first `yes_count` questions answered "yes".
pub(super) fn knowledge_answers(yes_count: usize) -> KnowledgeAnswers {
    let answer = |index: usize| {
        if index < yes_count {
            KnowledgeAnswer::Yes
        } else {
            KnowledgeAnswer::No
        }
    };
    KnowledgeAnswers {
        knowledge_1: answer(0),
        knowledge_2: answer(1),
        knowledge_3: answer(2),
        knowledge_4: answer(3),
        knowledge_5: answer(4),
        knowledge_6: answer(5),
    }
}

pub(super) fn nutrition_answers() -> NutritionAnswers {
    NutritionAnswers {
        knowledge: knowledge_answers(3),
        water_intake: WeightPerception::Normal,
        food_selection: EnergyLevel::Energetic,
    }
}

pub(super) fn nutrition() -> NutritionDraft {
    nutrition_answers().into()
}

pub(super) fn stress_answers(ratings: [u8; 5]) -> StressAnswers {
    let [a, b, c, d, e] = ratings.map(|value| StressRating::new(value).expect("valid rating"));
    StressAnswers {
        stress_1: a,
        stress_2: b,
        stress_3: c,
        stress_4: d,
        stress_5: e,
    }
}

pub(super) fn stress(ratings: [u8; 5]) -> StressDraft {
    stress_answers(ratings).into()
}

pub(super) fn build_service() -> (AssessmentService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = AssessmentService::new(repository.clone()).with_clock(fixed_now);
    (service, repository)
}

/// Walks every page for `owner` and returns the sealed record.
pub(super) fn complete_assessment(
    service: &AssessmentService<MemoryRepository>,
    owner: &UserId,
    height_cm: f64,
    weight_kg: f64,
    ratings: [u8; 5],
) -> AssessmentRecord {
    service.start(owner, true).expect("start");
    service
        .submit_personal_info(owner, personal_info(height_cm, weight_kg))
        .expect("personal info");
    service
        .submit_consumption(owner, consumption(Frequency::Daily))
        .expect("consumption");
    service.submit_nutrition(owner, nutrition()).expect("nutrition");
    service.submit_stress(owner, stress(ratings)).expect("stress")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<AssessmentId, AssessmentRecord>>>,
}

impl MemoryRepository {
    fn latest_matching<F>(&self, owner: &UserId, filter: F) -> Option<AssessmentRecord>
    where
        F: Fn(&AssessmentRecord) -> bool,
    {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .values()
            .filter(|record| &record.owner == owner && filter(record))
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .cloned()
    }
}

impl AssessmentRepository for MemoryRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        let active_exists = guard.values().any(|existing| {
            existing.owner == record.owner && existing.status == AssessmentStatus::Active
        });
        if record.status == AssessmentStatus::Active && active_exists {
            return Err(RepositoryError::ActiveAssessmentExists);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.revision != record.revision {
            return Err(RepositoryError::StaleRevision {
                expected: record.revision,
                found: stored.revision,
            });
        }
        record.revision += 1;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn latest_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(self.latest_matching(owner, |_| true))
    }

    fn latest_completed_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(self.latest_matching(owner, AssessmentRecord::is_completed))
    }
}

pub(super) struct UnavailableRepository;

impl AssessmentRepository for UnavailableRepository {
    fn insert(&self, _record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_for_owner(
        &self,
        _owner: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_completed_for_owner(
        &self,
        _owner: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
