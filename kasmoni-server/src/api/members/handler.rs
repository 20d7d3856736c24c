//! Member API Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use shared::YearMonth;
use shared::models::{MemberCreate, MemberStatus, MemberUpdate, MemberWithBank, Payment, SlotWithGroup};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::services::csv_transfer::{self, ImportReport};
use crate::services::{member_status, members};
use crate::utils::AppResult;

#[derive(serde::Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/members - all active members
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<MemberWithBank>>> {
    Ok(Json(members::list(&state.pool, &current_user).await?))
}

/// GET /api/members/search?q=xxx
pub async fn search(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<MemberWithBank>>> {
    Ok(Json(members::search(&state.pool, &current_user, &query.q).await?))
}

/// GET /api/members/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MemberWithBank>> {
    Ok(Json(members::get(&state.pool, &current_user, id).await?))
}

/// POST /api/members
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<MemberCreate>,
) -> AppResult<Json<MemberWithBank>> {
    Ok(Json(members::create(&state.pool, &current_user, payload).await?))
}

/// PUT /api/members/{id}
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<MemberUpdate>,
) -> AppResult<Json<MemberWithBank>> {
    Ok(Json(members::update(&state.pool, &current_user, id, payload).await?))
}

/// DELETE /api/members/{id} - soft delete
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    Ok(Json(members::delete(&state.pool, &current_user, id).await?))
}

/// GET /api/members/{id}/status
pub async fn status(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MemberStatus>> {
    let status =
        member_status::member_status(&state.pool, &current_user, id, YearMonth::current()).await?;
    Ok(Json(status))
}

/// GET /api/members/status - every member's status
pub async fn all_statuses(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<MemberStatus>>> {
    let statuses =
        member_status::all_member_statuses(&state.pool, &current_user, YearMonth::current()).await?;
    Ok(Json(statuses))
}

/// GET /api/members/{id}/slots
pub async fn slots(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<SlotWithGroup>>> {
    Ok(Json(members::slots_of(&state.pool, &current_user, id).await?))
}

/// GET /api/members/{id}/payments
pub async fn payments(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Payment>>> {
    Ok(Json(members::payments_of(&state.pool, &current_user, id).await?))
}

/// GET /api/members/export - CSV download
pub async fn export(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let csv = csv_transfer::export_members(&state.pool, &current_user).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"members.csv\"",
            ),
        ],
        csv,
    ))
}

/// POST /api/members/import - body is CSV text
pub async fn import(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    body: Bytes,
) -> AppResult<Json<ImportReport>> {
    let report = csv_transfer::import_members(&state.pool, &current_user, body.as_ref()).await?;
    Ok(Json(report))
}
