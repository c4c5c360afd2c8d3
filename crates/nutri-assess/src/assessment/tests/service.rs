use super::common::*;
use std::sync::Arc;

use crate::assessment::domain::{Frequency, PersonalInfoDraft};
use crate::assessment::repository::{AssessmentRepository, AssessmentStatus, RepositoryError};
use crate::assessment::scoring::{BmiCategory, StressLevel};
use crate::assessment::service::{AssessmentService, AssessmentServiceError};
use crate::assessment::{AssessmentStep, ValidationError};
use crate::auth::UserId;

#[test]
fn start_requires_consent() {
    let (service, repository) = build_service();

    match service.start(&owner(), false) {
        Err(AssessmentServiceError::Validation(ValidationError::ConsentRequired)) => {}
        other => panic!("expected consent error, got {other:?}"),
    }
    assert!(repository.records.lock().expect("lock").is_empty());
}

#[test]
fn start_resumes_the_active_record() {
    let (service, repository) = build_service();

    let first = service.start(&owner(), true).expect("start");
    service
        .submit_personal_info(&owner(), personal_info(170.0, 70.0))
        .expect("personal info");
    let resumed = service.start(&owner(), true).expect("resume");

    assert_eq!(first.id, resumed.id);
    assert_eq!(resumed.revision, 1);
    assert_eq!(repository.records.lock().expect("lock").len(), 1);
}

#[test]
fn full_walk_seals_the_record() {
    let (service, repository) = build_service();

    let sealed = complete_assessment(&service, &owner(), 170.0, 70.0, [3, 3, 2, 2, 1]);

    assert_eq!(sealed.status, AssessmentStatus::Completed);
    assert_eq!(sealed.completed_at, Some(fixed_now()));
    assert_eq!(sealed.consumption_score, Some(100));
    assert_eq!(sealed.stress_score, Some(11));
    assert_eq!(sealed.stress_level, Some(StressLevel::High));

    let stored = repository
        .fetch(&sealed.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored, sealed);

    let summary = service.results(&owner()).expect("results");
    assert_eq!(summary.bmi, Some(24.22));
    assert_eq!(summary.bmi_category, Some(BmiCategory::Normal));
    assert_eq!(summary.nutrition_knowledge_score, Some(50));
    assert_eq!(summary.recommendations.len(), 5);
}

#[test]
fn restarting_after_completion_opens_a_new_record() {
    let (service, _) = build_service();
    let sealed = complete_assessment(&service, &owner(), 170.0, 70.0, [0; 5]);

    let restarted = service.start(&owner(), true).expect("restart");

    assert_ne!(restarted.id, sealed.id);
    assert_eq!(restarted.status, AssessmentStatus::Active);
    let progress = service.progress(&owner()).expect("progress");
    assert_eq!(progress.current_step, AssessmentStep::PersonalInfo);

    let summary = service.results(&owner()).expect("previous results remain");
    assert_eq!(summary.assessment_id, sealed.id);
}

#[test]
fn skipping_ahead_names_the_missing_step() {
    let (service, _) = build_service();
    service.start(&owner(), true).expect("start");

    match service.submit_stress(&owner(), stress([1; 5])) {
        Err(AssessmentServiceError::OutOfOrder(error)) => {
            assert_eq!(error.required, AssessmentStep::PersonalInfo);
        }
        other => panic!("expected out of order, got {other:?}"),
    }
}

#[test]
fn steps_without_a_started_assessment_are_rejected() {
    let (service, _) = build_service();

    match service.submit_personal_info(&owner(), personal_info(170.0, 70.0)) {
        Err(AssessmentServiceError::NoActiveAssessment) => {}
        other => panic!("expected missing assessment, got {other:?}"),
    }
    match service.results(&owner()) {
        Err(AssessmentServiceError::NoCompletedAssessment) => {}
        other => panic!("expected missing results, got {other:?}"),
    }
}

#[test]
fn revisiting_personal_info_recomputes_bmi() {
    let (service, _) = build_service();
    service.start(&owner(), true).expect("start");
    service
        .submit_personal_info(&owner(), personal_info(170.0, 70.0))
        .expect("first pass");
    service
        .submit_consumption(&owner(), consumption(Frequency::RarelyOrNever))
        .expect("consumption");

    let updated = service
        .submit_personal_info(&owner(), personal_info(150.0, 90.0))
        .expect("revisit");

    assert_eq!(updated.bmi.map(|bmi| bmi.value()), Some(40.0));
    assert_eq!(updated.consumption_score, Some(33));
    assert_eq!(
        service.progress(&owner()).expect("progress").current_step,
        AssessmentStep::NutritionKnowledge
    );
}

#[test]
fn incomplete_personal_info_lists_every_gap() {
    let (service, _) = build_service();
    service.start(&owner(), true).expect("start");

    let draft = PersonalInfoDraft {
        age: Some(20),
        faculty: Some("  ".to_string()),
        ..PersonalInfoDraft::default()
    };

    match service.submit_personal_info(&owner(), draft) {
        Err(AssessmentServiceError::Validation(error)) => assert_eq!(
            error.unfinished_sections(),
            &[
                "2.2 gender",
                "2.3 year of study",
                "2.4 height",
                "2.5 weight",
                "2.6 faculty"
            ]
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn out_of_range_height_never_reaches_bmi() {
    let (service, _) = build_service();
    service.start(&owner(), true).expect("start");

    match service.submit_personal_info(&owner(), personal_info(0.0, 70.0)) {
        Err(AssessmentServiceError::Validation(ValidationError::NonPositive { field, .. })) => {
            assert_eq!(field, "height_cm");
        }
        other => panic!("expected non-positive height, got {other:?}"),
    }
    match service.submit_personal_info(&owner(), personal_info(260.0, 70.0)) {
        Err(AssessmentServiceError::Validation(ValidationError::OutOfRange { field, .. })) => {
            assert_eq!(field, "height_cm");
        }
        other => panic!("expected out of range height, got {other:?}"),
    }
}

#[test]
fn concurrent_write_is_reported_as_stale() {
    let (service, repository) = build_service();
    let record = service.start(&owner(), true).expect("start");

    let mut concurrent = record.clone();
    concurrent.updated_at = fixed_now();
    repository.update(concurrent).expect("first writer wins");

    match repository.update(record) {
        Err(RepositoryError::StaleRevision { expected, found }) => {
            assert_eq!(expected, 0);
            assert_eq!(found, 1);
        }
        other => panic!("expected stale revision, got {other:?}"),
    }
}

#[test]
fn second_active_record_is_rejected_by_storage() {
    let (service, repository) = build_service();
    let record = service.start(&owner(), true).expect("start");

    let mut duplicate = record.clone();
    duplicate.id = crate::assessment::AssessmentId("asm-duplicate".to_string());

    assert!(matches!(
        repository.insert(duplicate),
        Err(RepositoryError::ActiveAssessmentExists)
    ));

    let other_owner = UserId("user-0002".to_string());
    assert!(service.start(&other_owner, true).is_ok());
}

#[test]
fn missing_recommendations_are_regenerated_on_results() {
    let (service, repository) = build_service();
    let sealed = complete_assessment(&service, &owner(), 150.0, 40.0, [3, 3, 3, 3, 0]);

    let mut stripped = sealed.clone();
    stripped.recommendations = None;
    let stripped = repository.update(stripped).expect("strip advice");

    let summary = service.results(&owner()).expect("results");
    assert_eq!(summary.recommendations.len(), 6);

    let stored = repository
        .fetch(&sealed.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert!(stored.recommendations.is_some());
    assert_eq!(stored.revision, stripped.revision + 1);
}

#[test]
fn repository_failures_surface_unchanged() {
    let service = AssessmentService::new(Arc::new(UnavailableRepository));

    match service.start(&owner(), true) {
        Err(AssessmentServiceError::Repository(RepositoryError::Unavailable(message))) => {
            assert_eq!(message, "database offline");
        }
        other => panic!("expected unavailable repository, got {other:?}"),
    }
}
