//! Kasmoni Server - 轮转储蓄会 (kasmoni) 管理后台服务
//!
//! # 架构概述
//!
//! - **数据库** (`db`): SQLite (sqlx) 连接池、迁移、按表划分的 repository
//! - **认证** (`auth`): 外部身份服务签发的 JWT 校验，注入 [`CurrentUser`]
//! - **服务** (`services`): 会员状态聚合、CSV 导入导出、支付状态流转、统计分析
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! kasmoni-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、会话上下文
//! ├── services/      # 业务逻辑
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 日志、校验、时间
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export 统一错误类型 (来自 shared)
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export 日志初始化函数
pub use utils::logger::{init_logger, init_logger_with_file};

// 安全日志宏 - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境: 加载 .env 并初始化日志
pub fn setup_environment() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_json = std::env::var("LOG_JSON").ok().and_then(|v| v.parse().ok());
    let log_dir = std::env::var("LOG_DIR").ok();

    if let Some(dir) = &log_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::config(format!("Failed to create log dir {dir}: {e}")))?;
    }

    init_logger_with_file(log_level.as_deref(), log_json, log_dir.as_deref());
    Ok(())
}
