//! Password reset request API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{PasswordResetCreate, PasswordResetRequest, ResetStatus};
use shared::{ApiResponse, ErrorCode};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{password_reset, user};
use crate::security_log;
use crate::utils::validation::{validate_email, validate_id};
use crate::utils::{AppError, AppResult};

/// POST /api/password-reset-requests - public
///
/// The response is identical whether or not the address belongs to a user.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PasswordResetCreate>,
) -> AppResult<Json<ApiResponse<()>>> {
    let email = payload.email.trim().to_lowercase();
    validate_email(&email, "email")?;

    let known = user::find_by_email(&state.pool, &email).await?;
    let request = password_reset::create(&state.pool, &email, known.as_ref().map(|u| u.id)).await?;
    security_log!(
        "INFO",
        "password_reset_requested",
        request_id = request.id,
        known_user = known.is_some()
    );

    Ok(Json(ApiResponse::success_with_message(
        "Your request has been received. An administrator will contact you.",
        (),
    )))
}

/// GET /api/password-reset-requests - newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<PasswordResetRequest>>> {
    Ok(Json(password_reset::find_all(&state.pool).await?))
}

/// POST /api/password-reset-requests/{id}/resolve
pub async fn resolve(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<PasswordResetRequest>> {
    close(&state, &current_user, id, ResetStatus::Resolved).await.map(Json)
}

/// POST /api/password-reset-requests/{id}/reject
pub async fn reject(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<PasswordResetRequest>> {
    close(&state, &current_user, id, ResetStatus::Rejected).await.map(Json)
}

async fn close(
    state: &ServerState,
    current_user: &CurrentUser,
    id: i64,
    status: ResetStatus,
) -> Result<PasswordResetRequest, AppError> {
    validate_id(id, "request_id")?;
    let not_found = || AppError::new(ErrorCode::ResetRequestNotFound).with_detail("request_id", id);

    let existing = password_reset::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    if existing.status != ResetStatus::Pending
        || !password_reset::close(&state.pool, id, status, current_user.id).await?
    {
        return Err(AppError::new(ErrorCode::ResetRequestAlreadyProcessed)
            .with_detail("request_id", id));
    }

    tracing::info!(request_id = id, status = ?status, actor = current_user.id, "Password reset request closed");
    password_reset::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)
}
