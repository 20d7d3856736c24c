//! Savings group API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::YearMonth;
use shared::models::{
    Group, GroupCreate, GroupDetail, GroupSummary, GroupUpdate, Slot, SlotCreate, SlotWithMember,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::services::groups;
use crate::utils::AppResult;

/// GET /api/groups - with derived status and slot count
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<GroupSummary>>> {
    Ok(Json(groups::list(&state.pool, YearMonth::current()).await?))
}

/// GET /api/groups/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<GroupDetail>> {
    Ok(Json(groups::detail(&state.pool, id, YearMonth::current()).await?))
}

/// POST /api/groups
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<GroupCreate>,
) -> AppResult<Json<Group>> {
    Ok(Json(groups::create(&state.pool, &current_user, payload).await?))
}

/// PUT /api/groups/{id}
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<GroupUpdate>,
) -> AppResult<Json<Group>> {
    Ok(Json(groups::update(&state.pool, &current_user, id, payload).await?))
}

/// DELETE /api/groups/{id} - refused while slots remain
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    Ok(Json(groups::delete(&state.pool, &current_user, id).await?))
}

/// GET /api/groups/{id}/slots - ordered by month
pub async fn slots(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<SlotWithMember>>> {
    Ok(Json(groups::slots(&state.pool, id).await?))
}

/// POST /api/groups/{id}/slots
pub async fn add_slot(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<SlotCreate>,
) -> AppResult<Json<Slot>> {
    Ok(Json(groups::add_slot(&state.pool, &current_user, id, payload).await?))
}
