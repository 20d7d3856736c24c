//! Member Model

use serde::{Deserialize, Serialize};

/// Member entity (registered kasmoni participant)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    /// Date of birth (YYYY-MM-DD)
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub bank_id: Option<i64>,
    pub account_number: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Member with bank name (for list/detail views and CSV export)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MemberWithBank {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub bank_id: Option<i64>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create member payload (the member form)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberCreate {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub bank_id: Option<i64>,
    pub account_number: Option<String>,
}

/// Update member payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub national_id: Option<String>,
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub bank_id: Option<i64>,
    pub account_number: Option<String>,
    pub is_active: Option<bool>,
}
