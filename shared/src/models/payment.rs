//! Payment Model

use serde::{Deserialize, Serialize};

use crate::types::YearMonth;

/// Payment lifecycle status
///
/// ```text
/// pending ──► received ──► settled
///    │            │
///    ├──► settled └──► cancelled
///    └──► cancelled
/// ```
///
/// `settled` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PaymentStatus {
    Pending,
    Received,
    Settled,
    Cancelled,
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Received) | (Pending, Settled) | (Pending, Cancelled)
                | (Received, Settled) | (Received, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Settled | PaymentStatus::Cancelled)
    }

    /// Money has actually arrived
    pub fn is_collected(self) -> bool {
        matches!(self, PaymentStatus::Received | PaymentStatus::Settled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Received => "received",
            PaymentStatus::Settled => "settled",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

/// Direction of the money movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PaymentKind {
    /// Member pays the monthly contribution into the pool
    Contribution,
    /// Pool pays out to the slot holder of the month
    Payout,
}

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub member_id: i64,
    pub group_id: i64,
    pub slot_id: Option<i64>,
    pub amount: f64,
    pub kind: PaymentKind,
    pub status: PaymentStatus,
    pub payment_month: YearMonth,
    /// Date the money moved (YYYY-MM-DD)
    pub payment_date: Option<String>,
    pub sender_bank_id: Option<i64>,
    pub receiver_bank_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub member_id: i64,
    pub group_id: i64,
    pub slot_id: Option<i64>,
    pub amount: f64,
    pub kind: PaymentKind,
    /// Defaults to `pending`; only `pending` or `received` are accepted
    pub status: Option<PaymentStatus>,
    pub payment_month: YearMonth,
    pub payment_date: Option<String>,
    pub sender_bank_id: Option<i64>,
    pub receiver_bank_id: Option<i64>,
    pub notes: Option<String>,
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub status: PaymentStatus,
    pub payment_date: Option<String>,
    pub notes: Option<String>,
}

/// List filter (all fields optional, combined with AND)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub member_id: Option<i64>,
    pub group_id: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub from: Option<YearMonth>,
    pub to: Option<YearMonth>,
}
