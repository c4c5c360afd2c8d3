use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{Credentials, PasswordReset, PasswordResetRequest, Registration};
use super::otp::{OtpError, OtpNotifier};
use super::repository::UserRepository;
use super::service::{AuthError, AuthService};

/// Router builder exposing registration, sign-in, and password resets.
pub fn auth_router<U, N>(service: Arc<AuthService<U, N>>) -> Router
where
    U: UserRepository + 'static,
    N: OtpNotifier + 'static,
{
    Router::new()
        .route("/api/v1/auth/register", post(register_handler::<U, N>))
        .route("/api/v1/auth/login", post(login_handler::<U, N>))
        .route(
            "/api/v1/auth/password/forgot",
            post(forgot_password_handler::<U, N>),
        )
        .route(
            "/api/v1/auth/password/reset",
            post(reset_password_handler::<U, N>),
        )
        .with_state(service)
}

/// Runs a service call on the blocking pool. Every auth operation may hash or verify
/// a bcrypt password, which must stay off the async workers.
async fn run_blocking<U, N, T, F>(service: Arc<AuthService<U, N>>, call: F) -> Result<T, Response>
where
    U: UserRepository + 'static,
    N: OtpNotifier + 'static,
    T: Send + 'static,
    F: FnOnce(&AuthService<U, N>) -> Result<T, AuthError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || call(&service)).await {
        Ok(result) => result.map_err(error_response),
        Err(err) => {
            error!(error = %err, "auth task did not complete");
            let payload = json!({ "error": "internal error" });
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response())
        }
    }
}

pub(crate) async fn register_handler<U, N>(
    State(service): State<Arc<AuthService<U, N>>>,
    Json(registration): Json<Registration>,
) -> Response
where
    U: UserRepository + 'static,
    N: OtpNotifier + 'static,
{
    match run_blocking(service, move |service| service.register(registration)).await {
        Ok(account) => (StatusCode::CREATED, Json(account.view())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn login_handler<U, N>(
    State(service): State<Arc<AuthService<U, N>>>,
    Json(credentials): Json<Credentials>,
) -> Response
where
    U: UserRepository + 'static,
    N: OtpNotifier + 'static,
{
    match run_blocking(service, move |service| service.sign_in(credentials)).await {
        Ok(account) => (StatusCode::OK, Json(account.view())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn forgot_password_handler<U, N>(
    State(service): State<Arc<AuthService<U, N>>>,
    Json(request): Json<PasswordResetRequest>,
) -> Response
where
    U: UserRepository + 'static,
    N: OtpNotifier + 'static,
{
    let issued = run_blocking(service, move |service| {
        service.request_password_reset(&request.email)
    })
    .await;
    match issued {
        Ok(expires_at) => (
            StatusCode::ACCEPTED,
            Json(json!({
                "message": "a reset code has been sent to your email",
                "expires_at": expires_at,
            })),
        )
            .into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn reset_password_handler<U, N>(
    State(service): State<Arc<AuthService<U, N>>>,
    Json(reset): Json<PasswordReset>,
) -> Response
where
    U: UserRepository + 'static,
    N: OtpNotifier + 'static,
{
    match run_blocking(service, move |service| service.reset_password(reset)).await {
        Ok(account) => (StatusCode::OK, Json(account.view())).into_response(),
        Err(response) => response,
    }
}

pub(crate) fn error_response(err: AuthError) -> Response {
    let status = match &err {
        AuthError::InvalidEmail
        | AuthError::PasswordTooShort { .. }
        | AuthError::PasswordMismatch
        | AuthError::Otp(OtpError::Mismatch) => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::UnknownUser | AuthError::Otp(OtpError::NotFound) => StatusCode::NOT_FOUND,
        AuthError::InvalidPassword => StatusCode::UNAUTHORIZED,
        AuthError::Otp(OtpError::Expired) => StatusCode::GONE,
        AuthError::Otp(OtpError::Unavailable(_))
        | AuthError::Hash(_)
        | AuthError::Notify(_)
        | AuthError::Store(_) => {
            error!(error = %err, "auth request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
