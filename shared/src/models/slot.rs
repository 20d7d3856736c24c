//! Slot Model (group membership with an assigned payout month)

use serde::{Deserialize, Serialize};

use crate::types::YearMonth;

/// Slot entity (`group_members` row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Slot {
    pub id: i64,
    pub group_id: i64,
    pub member_id: i64,
    pub assigned_month: YearMonth,
    pub created_at: i64,
}

/// Slot joined with its group's name and contribution (status aggregation input)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SlotWithGroup {
    pub id: i64,
    pub group_id: i64,
    pub member_id: i64,
    pub assigned_month: YearMonth,
    pub group_name: String,
    pub monthly_amount: f64,
}

/// Slot joined with the member's name (group detail view)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SlotWithMember {
    pub id: i64,
    pub group_id: i64,
    pub member_id: i64,
    pub assigned_month: YearMonth,
    pub first_name: String,
    pub last_name: String,
}

/// Create slot payload (member joins a group)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCreate {
    pub member_id: i64,
    pub assigned_month: YearMonth,
}
