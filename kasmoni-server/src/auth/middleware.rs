//! 认证中间件
//!
//! 为 JWT 认证和角色检查提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::models::AuthLogCreate;

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::db::repository::{auth_log, user};
use crate::security_log;

/// 认证中间件 - 要求有效令牌和启用的用户
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT，按 `sub` 加载
/// `users` 行，将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (如 `/health`)
/// - `POST /api/password-reset-requests` (公开的重置申请)
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 | 审计事件 |
/// |------|------------|----------|
/// | 无 Authorization 头 | 401 NotAuthenticated | - |
/// | 令牌过期 | 401 TokenExpired | token_expired |
/// | 无效令牌 | 401 TokenInvalid | token_invalid |
/// | 用户不存在 | 401 TokenInvalid | user_unknown |
/// | 用户已停用 | 403 AccountDisabled | account_disabled |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS || !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let is_public_api_route =
        req.method() == http::Method::POST && path == "/api/password-reset-requests";
    if is_public_api_route {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    let claims = match state.get_jwt_service().validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );
            let (event, err) = match e {
                JwtError::ExpiredToken => ("token_expired", AppError::token_expired()),
                _ => ("token_invalid", AppError::invalid_token("Invalid token")),
            };
            record(&state, None, None, event, false, Some(e.to_string())).await;
            return Err(err);
        }
    };

    let user_id = claims
        .user_id()
        .map_err(|e| AppError::invalid_token(e.to_string()))?;

    let Some(account) = user::find_by_id(&state.pool, user_id).await? else {
        security_log!("WARN", "auth_unknown_user", user_id = user_id);
        record(&state, Some(user_id), claims.email.clone(), "user_unknown", false, None).await;
        return Err(AppError::invalid_token("Unknown user"));
    };

    if !account.is_active {
        security_log!("WARN", "auth_account_disabled", user_id = user_id);
        record(&state, Some(user_id), Some(account.email.clone()), "account_disabled", false, None)
            .await;
        return Err(AppError::new(shared::ErrorCode::AccountDisabled));
    }

    if state.sessions.first_use(user_id, claims.iat, claims.exp) {
        record(&state, Some(user_id), Some(account.email.clone()), "token_accepted", true, None)
            .await;
    }

    req.extensions_mut().insert(CurrentUser::from(&account));
    Ok(next.run(req).await)
}

/// 写入一条认证日志; 写入失败只记录日志，不阻断请求
async fn record(
    state: &ServerState,
    user_id: Option<i64>,
    email: Option<String>,
    event: &str,
    success: bool,
    detail: Option<String>,
) {
    let entry = AuthLogCreate {
        user_id,
        email,
        event: event.to_string(),
        success,
        detail,
    };
    if let Err(e) = auth_log::insert(&state.pool, &entry).await {
        tracing::warn!(event = %event, error = %e, "Failed to write auth log");
    }
}

/// 管理员中间件 - 要求 admin 或 super_user 角色
///
/// # 错误
///
/// 非管理员返回 403 AdminRequired
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req.current_user()?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id,
            user_role = user.role.as_str(),
            uri = format!("{:?}", req.uri())
        );
        return Err(AppError::admin_required(&format!(
            "{} {}",
            req.method(),
            req.uri().path()
        )));
    }

    Ok(next.run(req).await)
}

/// 超级用户中间件 - 要求 super_user 角色
///
/// # 错误
///
/// 非超级用户返回 403 SuperUserRequired
pub async fn require_super_user(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req.current_user()?;
    if !user.is_super_user() {
        security_log!(
            "WARN",
            "super_user_required",
            user_id = user.id,
            user_role = user.role.as_str()
        );
        return Err(AppError::new(shared::ErrorCode::SuperUserRequired));
    }

    Ok(next.run(req).await)
}

/// 从请求中提取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 从请求扩展中获取 CurrentUser
    ///
    /// # 错误
    ///
    /// 未认证返回 401 NotAuthenticated
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or(AppError::unauthorized())
    }
}
