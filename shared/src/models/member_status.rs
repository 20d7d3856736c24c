//! Member status snapshot (derived, never persisted)

use serde::{Deserialize, Serialize};

use crate::types::YearMonth;

/// Aggregate participation state of one member
///
/// A pure function of the member's slot and payment rows at a given month.
/// Recomputed on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberStatus {
    pub member_id: i64,
    /// Some slot's month is the current month or later
    pub is_active: bool,
    pub total_slots: i64,
    /// Sum of each slot's group monthly amount
    pub total_monthly_amount: f64,
    /// Earliest slot month not before the current month
    pub next_receive_month: Option<YearMonth>,
    /// Contributions that have been received or settled
    pub total_paid: f64,
    pub pending_payments: i64,
}

impl MemberStatus {
    /// Snapshot of a member without any slots or payments
    pub fn empty(member_id: i64) -> Self {
        Self {
            member_id,
            is_active: false,
            total_slots: 0,
            total_monthly_amount: 0.0,
            next_receive_month: None,
            total_paid: 0.0,
            pending_payments: 0,
        }
    }
}
