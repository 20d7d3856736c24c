//! Auth log API 模块 (仅管理员)

use axum::{
    Json, Router,
    extract::{Query, State},
    middleware,
    routing::get,
};
use shared::models::AuthLog;

use crate::auth::require_admin;
use crate::core::ServerState;
use crate::db::repository::auth_log;
use crate::utils::AppResult;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth-logs", get(list))
        .layer(middleware::from_fn(require_admin))
}

#[derive(Debug, serde::Deserialize)]
pub struct LogQuery {
    pub limit: Option<i64>,
}

/// GET /api/auth-logs?limit= - 最新在前
async fn list(
    State(state): State<ServerState>,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<Vec<AuthLog>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(auth_log::find_recent(&state.pool, limit).await?))
}
