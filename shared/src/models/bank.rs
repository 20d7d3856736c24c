//! Bank Model

use serde::{Deserialize, Serialize};

/// Bank entity (member accounts and payment routing)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Bank {
    pub id: i64,
    pub name: String,
    pub short_name: Option<String>,
    pub created_at: i64,
}

/// Create bank payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankCreate {
    pub name: String,
    pub short_name: Option<String>,
}

/// Update bank payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankUpdate {
    pub name: Option<String>,
    pub short_name: Option<String>,
}
