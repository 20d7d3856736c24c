//! Bank API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ErrorCode;
use shared::models::{Bank, BankCreate, BankUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, bank};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, normalize_optional, validate_id, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/banks
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Bank>>> {
    Ok(Json(bank::find_all(&state.pool).await?))
}

/// POST /api/banks
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<BankCreate>,
) -> AppResult<Json<Bank>> {
    let payload = BankCreate {
        name: payload.name.trim().to_string(),
        short_name: normalize_optional(payload.short_name),
    };
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.short_name, "short_name", MAX_SHORT_TEXT_LEN)?;

    let created = bank::create(&state.pool, payload)
        .await
        .map_err(map_duplicate)?;
    tracing::info!(bank_id = created.id, actor = current_user.id, "Bank created");
    Ok(Json(created))
}

/// PUT /api/banks/{id}
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<BankUpdate>,
) -> AppResult<Json<Bank>> {
    validate_id(id, "bank_id")?;
    let payload = BankUpdate {
        name: payload.name.map(|n| n.trim().to_string()),
        short_name: normalize_optional(payload.short_name),
    };
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.short_name, "short_name", MAX_SHORT_TEXT_LEN)?;

    let updated = bank::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => bank_not_found(id),
            other => map_duplicate(other),
        })?;
    tracing::info!(bank_id = id, actor = current_user.id, "Bank updated");
    Ok(Json(updated))
}

/// DELETE /api/banks/{id} - refused while members or payments reference it
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    validate_id(id, "bank_id")?;
    if bank::find_by_id(&state.pool, id).await?.is_none() {
        return Err(bank_not_found(id));
    }
    let usage = bank::usage_count(&state.pool, id).await?;
    if usage > 0 {
        return Err(AppError::new(ErrorCode::BankInUse)
            .with_detail("bank_id", id)
            .with_detail("references", usage));
    }

    let deleted = bank::delete(&state.pool, id).await?;
    tracing::info!(bank_id = id, actor = current_user.id, "Bank deleted");
    Ok(Json(deleted))
}

fn bank_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::BankNotFound).with_detail("bank_id", id)
}

fn map_duplicate(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::BankNameExists).with_detail("field", "name"),
        other => other.into(),
    }
}
