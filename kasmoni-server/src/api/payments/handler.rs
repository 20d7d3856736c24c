//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Payment, PaymentCreate, PaymentFilter, PaymentStatus, PaymentStatusUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::services::payments;
use crate::utils::AppResult;
use crate::utils::time::parse_month_param;

/// Query string of `GET /api/payments`
#[derive(Debug, Default, serde::Deserialize)]
pub struct PaymentQuery {
    pub member_id: Option<i64>,
    pub group_id: Option<i64>,
    pub status: Option<PaymentStatus>,
    /// YYYY-MM, inclusive
    pub from: Option<String>,
    /// YYYY-MM, inclusive
    pub to: Option<String>,
}

/// GET /api/payments - newest month first
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(query): Query<PaymentQuery>,
) -> AppResult<Json<Vec<Payment>>> {
    let filter = PaymentFilter {
        member_id: query.member_id,
        group_id: query.group_id,
        status: query.status,
        from: parse_month_param(query.from.as_deref(), "from")?,
        to: parse_month_param(query.to.as_deref(), "to")?,
    };
    Ok(Json(payments::list(&state.pool, &current_user, filter).await?))
}

/// GET /api/payments/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Payment>> {
    Ok(Json(payments::get(&state.pool, &current_user, id).await?))
}

/// POST /api/payments
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<Payment>> {
    Ok(Json(payments::create(&state.pool, &current_user, payload).await?))
}

/// PUT /api/payments/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> AppResult<Json<Payment>> {
    Ok(Json(payments::update_status(&state.pool, &current_user, id, payload).await?))
}
