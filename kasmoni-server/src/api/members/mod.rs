//! Member API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/members", routes())
}

fn routes() -> Router<ServerState> {
    // 本人或管理员：由服务层检查
    let read_routes = Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", get(handler::status))
        .route("/{id}/slots", get(handler::slots))
        .route("/{id}/payments", get(handler::payments));

    // 管理路由：仅管理员
    let manage_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/search", get(handler::search))
        .route("/status", get(handler::all_statuses))
        .route("/export", get(handler::export))
        .route("/import", post(handler::import))
        .route("/{id}", axum::routing::put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(manage_routes)
}
