//! Password reset request Model

use serde::{Deserialize, Serialize};

/// Reset request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ResetStatus {
    Pending,
    Resolved,
    Rejected,
}

/// Password reset request entity (handled manually by an administrator)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PasswordResetRequest {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: String,
    pub status: ResetStatus,
    pub resolved_by: Option<i64>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

/// Public reset request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetCreate {
    pub email: String,
}
