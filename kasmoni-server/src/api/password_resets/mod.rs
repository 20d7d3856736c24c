//! Password reset request API 模块
//!
//! 创建请求是公开接口 (认证中间件放行 `POST /api/password-reset-requests`)，
//! 管理员线下处理后标记为 resolved 或 rejected。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/password-reset-requests", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new().route("/", post(handler::create));

    let manage_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/resolve", post(handler::resolve))
        .route("/{id}/reject", post(handler::reject))
        .layer(middleware::from_fn(require_admin));

    public_routes.merge(manage_routes)
}
