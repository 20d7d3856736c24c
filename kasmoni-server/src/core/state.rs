use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{JwtService, SessionTracker};
use crate::core::Config;
use crate::db::DbService;
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求 clone 一份。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 校验服务 |
/// | sessions | Arc<SessionTracker> | 已见会话 (token_accepted 审计去重) |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 校验服务
    pub jwt_service: Arc<JwtService>,
    /// 已见会话
    pub sessions: Arc<SessionTracker>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            pool,
            jwt_service,
            sessions: Arc::new(SessionTracker::new()),
        }
    }

    /// 打开数据库、执行迁移并构造状态
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::new(config.clone(), db.pool))
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
