use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{ConsumptionDraft, NutritionDraft, PersonalInfoDraft, StressDraft};
use super::flow::AssessmentProgress;
use super::repository::{AssessmentRecord, AssessmentRepository, RepositoryError};
use super::service::{AssessmentService, AssessmentServiceError};
use crate::auth::UserId;

#[derive(Debug, Deserialize)]
pub(crate) struct StartRequest {
    #[serde(default)]
    consent: bool,
}

/// Router builder exposing the questionnaire pages and the results view.
pub fn assessment_router<R>(service: Arc<AssessmentService<R>>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/assessment",
            post(start_handler::<R>).get(progress_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/assessment/personal-info",
            put(personal_info_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/assessment/consumption",
            put(consumption_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/assessment/nutrition",
            put(nutrition_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/assessment/stress",
            put(stress_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/assessment/results",
            get(results_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.start(&UserId(user_id), request.consent) {
        Ok(record) => {
            (StatusCode::CREATED, Json(AssessmentProgress::of(&record))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn progress_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    match service.progress(&UserId(user_id)) {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn personal_info_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<PersonalInfoDraft>, JsonRejection>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let Json(draft) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    progress_response(service.submit_personal_info(&UserId(user_id), draft))
}

pub(crate) async fn consumption_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<ConsumptionDraft>, JsonRejection>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let Json(draft) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    progress_response(service.submit_consumption(&UserId(user_id), draft))
}

pub(crate) async fn nutrition_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<NutritionDraft>, JsonRejection>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let Json(draft) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    progress_response(service.submit_nutrition(&UserId(user_id), draft))
}

pub(crate) async fn stress_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<StressDraft>, JsonRejection>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let Json(draft) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.submit_stress(&UserId(user_id), draft) {
        Ok(record) => (StatusCode::OK, Json(record.summary())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn results_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    match service.results(&UserId(user_id)) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

fn progress_response(
    result: Result<AssessmentRecord, AssessmentServiceError>,
) -> Response {
    match result {
        Ok(record) => (StatusCode::OK, Json(AssessmentProgress::of(&record))).into_response(),
        Err(err) => error_response(err),
    }
}

/// Bodies serde cannot decode, such as off-scale ratings or malformed JSON,
/// answer with the same payload shape as service-level validation failures.
fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
        "unfinished_sections": Vec::<&str>::new(),
    });
    (rejection.status(), Json(payload)).into_response()
}

pub(crate) fn error_response(err: AssessmentServiceError) -> Response {
    match err {
        AssessmentServiceError::Validation(validation) => {
            let payload = json!({
                "error": validation.to_string(),
                "unfinished_sections": validation.unfinished_sections(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        AssessmentServiceError::OutOfOrder(out_of_order) => {
            let payload = json!({
                "error": out_of_order.to_string(),
                "required_step": out_of_order.required,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        AssessmentServiceError::NoActiveAssessment
        | AssessmentServiceError::NoCompletedAssessment => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        AssessmentServiceError::Repository(
            RepositoryError::StaleRevision { .. }
            | RepositoryError::ActiveAssessmentExists
            | RepositoryError::Conflict,
        ) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        other => {
            error!(error = %other, "assessment request failed");
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
