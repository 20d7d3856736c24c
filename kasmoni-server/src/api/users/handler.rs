//! User management API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ErrorCode;
use shared::models::{Role, User, UserCreate, UserUpdate};
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, member, user};
use crate::security_log;
use crate::utils::validation::{
    MAX_NAME_LEN, normalize_optional, validate_email, validate_id, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/users
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(user::find_all(&state.pool).await?))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    validate_id(id, "user_id")?;
    let found = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(Json(found))
}

/// POST /api/users - create an account (super user)
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<User>> {
    let payload = UserCreate {
        email: payload.email.trim().to_lowercase(),
        display_name: payload.display_name.trim().to_string(),
        ..payload
    };
    validate_email(&payload.email, "email")?;
    validate_required_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    if let Some(member_id) = payload.member_id {
        ensure_member_exists(&state.pool, member_id).await?;
    }
    if user::find_by_email(&state.pool, &payload.email).await?.is_some() {
        return Err(email_exists());
    }

    let created = user::create(&state.pool, payload)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => email_exists(),
            other => other.into(),
        })?;
    security_log!(
        "INFO",
        "user_created",
        user_id = created.id,
        user_role = created.role.as_str(),
        actor = current_user.id
    );
    Ok(Json(created))
}

/// PUT /api/users/{id} - change role, activation or profile (super user)
///
/// A super user cannot demote or deactivate their own account.
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    validate_id(id, "user_id")?;
    let payload = UserUpdate {
        display_name: normalize_optional(payload.display_name),
        ..payload
    };
    if let Some(name) = &payload.display_name {
        validate_required_text(name, "display_name", MAX_NAME_LEN)?;
    }

    if id == current_user.id {
        let demotes = payload.role.is_some_and(|r| r != Role::SuperUser);
        let deactivates = payload.is_active == Some(false);
        if demotes || deactivates {
            return Err(AppError::new(ErrorCode::CannotModifySelf).with_detail("user_id", id));
        }
    }
    if let Some(member_id) = payload.member_id {
        ensure_member_exists(&state.pool, member_id).await?;
    }

    let updated = user::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => user_not_found(id),
            other => other.into(),
        })?;
    security_log!(
        "INFO",
        "user_updated",
        user_id = id,
        user_role = updated.role.as_str(),
        is_active = updated.is_active,
        actor = current_user.id
    );
    Ok(Json(updated))
}

async fn ensure_member_exists(pool: &SqlitePool, member_id: i64) -> Result<(), AppError> {
    validate_id(member_id, "member_id")?;
    if member::find_member_by_id(pool, member_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::MemberNotFound).with_detail("field", "member_id"));
    }
    Ok(())
}

fn user_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::UserNotFound).with_detail("user_id", id)
}

fn email_exists() -> AppError {
    AppError::new(ErrorCode::UserEmailExists).with_detail("field", "email")
}
