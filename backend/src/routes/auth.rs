use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{
    error::AuthError,
    models::{
        auth::AuthenticatedUser,
        user::{
            ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse,
            MeResponse, MessageResponse, ResetPasswordRequest,
        },
    },
    AppState,
};

/// A body that is not JSON, or has fields of the wrong type, reads as empty so
/// the required-field validation answers it with a 400.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!("unreadable request body: {}", rejection.body_text());
            T::default()
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    state.auth.login(&body_or_default(payload)).await.map(Json)
}

/// Always 200 for a well-formed request, whether or not the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<ForgotPasswordResponse>, AuthError> {
    state
        .auth
        .request_password_reset(&body_or_default(payload))
        .await
        .map(Json)
}

pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AuthError> {
    state.auth.reset_password(&body_or_default(payload)).await.map(Json)
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<MeResponse>, AuthError> {
    let profile = state.auth.current_user(user.user_id).await?;
    Ok(Json(MeResponse {
        success: true,
        user: profile,
    }))
}
