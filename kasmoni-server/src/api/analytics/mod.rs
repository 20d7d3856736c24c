//! Analytics API (admin only)

use axum::{
    Json, Router,
    extract::{Query, State},
    middleware,
    routing::get,
};
use shared::YearMonth;

use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::services::analytics::{self, BankTotals, Overview, TrendPoint};
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/analytics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/banks", get(banks))
        .route("/trend", get(trend))
        .layer(middleware::from_fn(require_admin))
}

#[derive(Debug, serde::Deserialize)]
pub struct TrendQuery {
    pub months: Option<u32>,
}

/// GET /api/analytics/overview
async fn overview(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Overview>> {
    let overview = analytics::overview(&state.pool, &current_user, YearMonth::current()).await?;
    Ok(Json(overview))
}

/// GET /api/analytics/banks
async fn banks(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<BankTotals>> {
    Ok(Json(analytics::bank_totals(&state.pool, &current_user).await?))
}

/// GET /api/analytics/trend?months=
async fn trend(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<Vec<TrendPoint>>> {
    let months = query
        .months
        .unwrap_or(state.config.trend_months_default);
    let points =
        analytics::trend(&state.pool, &current_user, YearMonth::current(), months).await?;
    Ok(Json(points))
}
