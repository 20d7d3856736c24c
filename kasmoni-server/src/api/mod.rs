//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (公开)
//! - [`password_resets`] - 密码重置请求 (创建公开，处理需管理员)
//! - [`me`] - 当前用户
//! - [`members`] - 会员、会员状态、CSV 导入导出
//! - [`groups`] / [`slots`] - 储蓄会与名额
//! - [`payments`] - 支付记录
//! - [`banks`] - 银行
//! - [`messages`] - 站内消息
//! - [`analytics`] - 统计
//! - [`auth_logs`] - 认证日志
//! - [`users`] - 用户管理

pub mod analytics;
pub mod auth_logs;
pub mod banks;
pub mod groups;
pub mod health;
pub mod me;
pub mod members;
pub mod messages;
pub mod password_resets;
pub mod payments;
pub mod slots;
pub mod users;

// Re-export 处理器常用类型
pub use crate::utils::AppResult;
