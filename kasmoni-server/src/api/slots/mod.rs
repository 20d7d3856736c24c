//! Slot API 模块
//!
//! 名额的创建挂在 `/api/groups/{id}/slots`，这里只有删除。

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::delete,
};

use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::services::groups;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/slots/{id}", delete(remove))
        .layer(middleware::from_fn(require_admin))
}

/// DELETE /api/slots/{id} - 已有支付引用时拒绝
async fn remove(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    Ok(Json(groups::remove_slot(&state.pool, &current_user, id).await?))
}
