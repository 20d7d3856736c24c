//! Savings Group Model

use serde::{Deserialize, Serialize};

use crate::types::YearMonth;

/// Savings group entity (rotating pool with a fixed monthly contribution)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub monthly_amount: f64,
    pub start_month: YearMonth,
    pub end_month: YearMonth,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Group {
    /// Number of months the group runs (inclusive of both ends)
    pub fn duration_months(&self) -> i32 {
        self.start_month.months_until(self.end_month) + 1
    }

    /// Whether `month` lies within the group period
    pub fn covers(&self, month: YearMonth) -> bool {
        self.start_month <= month && month <= self.end_month
    }

    /// Lifecycle position of the group relative to `now`
    pub fn status_at(&self, now: YearMonth) -> GroupStatus {
        if now < self.start_month {
            GroupStatus::Upcoming
        } else if now > self.end_month {
            GroupStatus::Completed
        } else {
            GroupStatus::Active
        }
    }
}

/// Derived group lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Upcoming,
    Active,
    Completed,
}

/// Create group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCreate {
    pub name: String,
    pub description: Option<String>,
    pub monthly_amount: f64,
    pub start_month: YearMonth,
    pub end_month: YearMonth,
}

/// Update group payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub monthly_amount: Option<f64>,
    pub start_month: Option<YearMonth>,
    pub end_month: Option<YearMonth>,
}

/// Group list entry with slot count and derived status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: Group,
    pub slot_count: i64,
    pub status: GroupStatus,
}

/// Group detail: slots in payout order and the monthly pot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub status: GroupStatus,
    pub slots: Vec<crate::models::SlotWithMember>,
    /// monthly_amount × number of slots
    pub monthly_pot: f64,
}
