//! Member Status Aggregator
//!
//! Derives a [`MemberStatus`] snapshot from a member's slot and payment rows.
//! Nothing is stored or cached; every call reads the rows again.
//!
//! Month comparisons are inclusive: a slot in the current month still counts
//! as upcoming, so a member receiving the pot this month is active and this
//! month is their next receive month.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::YearMonth;
use shared::models::{MemberStatus, MemberWithBank, Payment, PaymentKind, PaymentStatus, SlotWithGroup};
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::repository::{member, payment, slot};
use crate::services::{ensure_admin, ensure_can_view_member};
use crate::utils::AppError;
use crate::utils::validation::validate_id;

/// Reduce slot and payment rows to a status snapshot
///
/// Pure: the result depends only on the arguments, and not on their order.
pub fn compute_status(
    member_id: i64,
    slots: &[SlotWithGroup],
    payments: &[Payment],
    now: YearMonth,
) -> MemberStatus {
    let total_monthly: Decimal = slots
        .iter()
        .map(|s| shared::util::to_decimal(s.monthly_amount))
        .sum();

    let next_receive_month = slots
        .iter()
        .map(|s| s.assigned_month)
        .filter(|month| *month >= now)
        .min();

    let total_paid: Decimal = payments
        .iter()
        .filter(|p| p.kind == PaymentKind::Contribution && p.status.is_collected())
        .map(|p| shared::util::to_decimal(p.amount))
        .sum();

    let pending_payments = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Pending)
        .count() as i64;

    MemberStatus {
        member_id,
        is_active: next_receive_month.is_some(),
        total_slots: slots.len() as i64,
        total_monthly_amount: shared::util::to_f64(total_monthly),
        next_receive_month,
        total_paid: shared::util::to_f64(total_paid),
        pending_payments,
    }
}

/// Status of one member
///
/// Admins may query any member; other roles only their linked member.
/// The member row, its slots and its payments are fetched concurrently.
pub async fn member_status(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    member_id: i64,
    now: YearMonth,
) -> Result<MemberStatus, AppError> {
    validate_id(member_id, "member_id")?;
    ensure_can_view_member(ctx, member_id)?;

    let (found, slots, payments) = tokio::try_join!(
        member::find_member_by_id(pool, member_id),
        slot::find_by_member(pool, member_id),
        payment::find_by_member(pool, member_id),
    )?;

    if found.is_none() {
        return Err(AppError::new(shared::ErrorCode::MemberNotFound)
            .with_detail("member_id", member_id));
    }

    Ok(compute_status(member_id, &slots, &payments, now))
}

/// Status of every active member, in member list order
///
/// Three queries run concurrently (members, all slots, all payments); rows
/// are grouped by member id and reduced with [`compute_status`], so each
/// entry equals what [`member_status`] returns for that member.
pub async fn all_member_statuses(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    now: YearMonth,
) -> Result<Vec<MemberStatus>, AppError> {
    ensure_admin(ctx, "view member statuses")?;

    let (members, slots, payments) = tokio::try_join!(
        member::find_all(pool),
        slot::find_all_with_group(pool),
        payment::find_all(pool),
    )?;

    Ok(statuses_from_rows(&members, &slots, &payments, now))
}

/// Group already-loaded rows by member and compute each status
pub(crate) fn statuses_from_rows(
    members: &[MemberWithBank],
    slots: &[SlotWithGroup],
    payments: &[Payment],
    now: YearMonth,
) -> Vec<MemberStatus> {
    let mut slots_by_member: HashMap<i64, Vec<SlotWithGroup>> = HashMap::new();
    for s in slots {
        slots_by_member.entry(s.member_id).or_default().push(s.clone());
    }
    let mut payments_by_member: HashMap<i64, Vec<Payment>> = HashMap::new();
    for p in payments {
        payments_by_member.entry(p.member_id).or_default().push(p.clone());
    }

    members
        .iter()
        .map(|m| {
            let slots = slots_by_member.get(&m.id).map(Vec::as_slice).unwrap_or(&[]);
            let payments = payments_by_member.get(&m.id).map(Vec::as_slice).unwrap_or(&[]);
            compute_status(m.id, slots, payments, now)
        })
        .collect()
}
