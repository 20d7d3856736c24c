//! Authentication log Model

use serde::{Deserialize, Serialize};

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AuthLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: Option<String>,
    /// Event name, e.g. `token_accepted`, `token_expired`, `token_invalid`, `account_disabled`
    pub event: String,
    pub success: bool,
    pub detail: Option<String>,
    pub created_at: i64,
}

/// New authentication event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthLogCreate {
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub event: String,
    pub success: bool,
    pub detail: Option<String>,
}
