//! Current user API

use axum::{Json, Router, extract::State, routing::get};
use shared::models::User;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/me", get(me))
}

/// GET /api/me - the signed-in user
async fn me(State(state): State<ServerState>, current_user: CurrentUser) -> AppResult<Json<User>> {
    let found = user::find_by_id(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::new(shared::ErrorCode::UserNotFound))?;
    Ok(Json(found))
}
