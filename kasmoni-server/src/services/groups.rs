//! Savings groups and slots
//!
//! A slot is a member's payout month in a group. Months are unique per group
//! and must lie within the group period.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::models::{
    Group, GroupCreate, GroupDetail, GroupSummary, GroupUpdate, Slot, SlotCreate, SlotWithMember,
};
use shared::{ErrorCode, YearMonth};
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::repository::{RepoError, group, member, payment, slot};
use crate::services::ensure_admin;
use crate::utils::AppError;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, normalize_optional, validate_id, validate_optional_text,
    validate_positive_amount, validate_required_text,
};

/// All groups with slot counts and lifecycle status at `now`
pub async fn list(pool: &SqlitePool, now: YearMonth) -> Result<Vec<GroupSummary>, AppError> {
    let (groups, counts) = tokio::try_join!(group::find_all(pool), slot::count_by_group(pool))?;
    let counts: HashMap<i64, i64> = counts.into_iter().collect();

    Ok(groups
        .into_iter()
        .map(|g| GroupSummary {
            slot_count: counts.get(&g.id).copied().unwrap_or(0),
            status: g.status_at(now),
            group: g,
        })
        .collect())
}

pub async fn detail(pool: &SqlitePool, id: i64, now: YearMonth) -> Result<GroupDetail, AppError> {
    validate_id(id, "group_id")?;
    let (found, slots) = tokio::try_join!(group::find_by_id(pool, id), slot::find_by_group(pool, id))?;
    let group = found.ok_or_else(|| group_not_found(id))?;

    let pot = shared::util::to_decimal(group.monthly_amount) * Decimal::from(slots.len() as i64);
    Ok(GroupDetail {
        status: group.status_at(now),
        monthly_pot: shared::util::to_f64(pot),
        group,
        slots,
    })
}

pub async fn create(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    payload: GroupCreate,
) -> Result<Group, AppError> {
    ensure_admin(ctx, "create groups")?;
    let payload = GroupCreate {
        name: payload.name.trim().to_string(),
        description: normalize_optional(payload.description),
        ..payload
    };
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_positive_amount(payload.monthly_amount, "monthly_amount")?;
    validate_period(payload.start_month, payload.end_month)?;

    let created = group::create(pool, payload).await?;
    tracing::info!(group_id = created.id, actor = ctx.id, "Group created");
    Ok(created)
}

pub async fn update(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    id: i64,
    payload: GroupUpdate,
) -> Result<Group, AppError> {
    ensure_admin(ctx, "update groups")?;
    validate_id(id, "group_id")?;
    let current = group::find_by_id(pool, id)
        .await?
        .ok_or_else(|| group_not_found(id))?;

    let payload = GroupUpdate {
        name: payload.name.map(|n| n.trim().to_string()),
        description: normalize_optional(payload.description),
        ..payload
    };
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    if let Some(amount) = payload.monthly_amount {
        validate_positive_amount(amount, "monthly_amount")?;
    }

    let start = payload.start_month.unwrap_or(current.start_month);
    let end = payload.end_month.unwrap_or(current.end_month);
    validate_period(start, end)?;

    // Existing slots must stay inside the new period
    if let Some((first, last)) = slot::month_bounds(pool, id).await?
        && (first < start || last > end)
    {
        return Err(AppError::with_message(
            ErrorCode::SlotOutOfRange,
            format!("Assigned slots span {first} to {last}, outside {start} to {end}"),
        ));
    }

    let updated = group::update(pool, id, payload).await.map_err(|e| match e {
        RepoError::NotFound(_) => group_not_found(id),
        other => other.into(),
    })?;
    tracing::info!(group_id = id, actor = ctx.id, "Group updated");
    Ok(updated)
}

/// Delete a group without slots
pub async fn delete(pool: &SqlitePool, ctx: &CurrentUser, id: i64) -> Result<bool, AppError> {
    ensure_admin(ctx, "delete groups")?;
    validate_id(id, "group_id")?;
    if group::find_by_id(pool, id).await?.is_none() {
        return Err(group_not_found(id));
    }
    let slots = slot::count_for_group(pool, id).await?;
    if slots > 0 {
        return Err(AppError::new(ErrorCode::GroupHasSlots).with_detail("slot_count", slots));
    }
    let deleted = group::delete(pool, id).await?;
    tracing::info!(group_id = id, actor = ctx.id, "Group deleted");
    Ok(deleted)
}

pub async fn slots(pool: &SqlitePool, group_id: i64) -> Result<Vec<SlotWithMember>, AppError> {
    validate_id(group_id, "group_id")?;
    if group::find_by_id(pool, group_id).await?.is_none() {
        return Err(group_not_found(group_id));
    }
    Ok(slot::find_by_group(pool, group_id).await?)
}

/// Assign a member to a payout month in the group
pub async fn add_slot(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    group_id: i64,
    payload: SlotCreate,
) -> Result<Slot, AppError> {
    ensure_admin(ctx, "assign slots")?;
    validate_id(group_id, "group_id")?;
    validate_id(payload.member_id, "member_id")?;

    let (found_group, found_member, taken) = tokio::try_join!(
        group::find_by_id(pool, group_id),
        member::find_member_by_id(pool, payload.member_id),
        slot::find_by_group_month(pool, group_id, payload.assigned_month),
    )?;

    let group = found_group.ok_or_else(|| group_not_found(group_id))?;
    let member = found_member.ok_or_else(|| {
        AppError::new(ErrorCode::MemberNotFound).with_detail("member_id", payload.member_id)
    })?;
    if !member.is_active {
        return Err(AppError::new(ErrorCode::MemberInactive).with_detail("member_id", member.id));
    }
    if !group.covers(payload.assigned_month) {
        return Err(AppError::with_message(
            ErrorCode::SlotOutOfRange,
            format!(
                "{} is outside the group period {} to {}",
                payload.assigned_month, group.start_month, group.end_month
            ),
        )
        .with_detail("field", "assigned_month"));
    }
    if taken.is_some() {
        return Err(month_taken(payload.assigned_month));
    }

    let created = slot::create(pool, group_id, member.id, payload.assigned_month)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent assignment
            RepoError::Duplicate(_) => month_taken(payload.assigned_month),
            other => other.into(),
        })?;
    tracing::info!(
        slot_id = created.id,
        group_id,
        member_id = member.id,
        month = %created.assigned_month,
        actor = ctx.id,
        "Slot assigned"
    );
    Ok(created)
}

/// Remove a slot that no payment references
pub async fn remove_slot(pool: &SqlitePool, ctx: &CurrentUser, slot_id: i64) -> Result<bool, AppError> {
    ensure_admin(ctx, "remove slots")?;
    validate_id(slot_id, "slot_id")?;
    if slot::find_by_id(pool, slot_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::SlotNotFound).with_detail("slot_id", slot_id));
    }
    let payments = payment::count_for_slot(pool, slot_id).await?;
    if payments > 0 {
        return Err(AppError::new(ErrorCode::SlotHasPayments).with_detail("payment_count", payments));
    }
    let deleted = slot::delete(pool, slot_id).await?;
    tracing::info!(slot_id, actor = ctx.id, "Slot removed");
    Ok(deleted)
}

fn validate_period(start: YearMonth, end: YearMonth) -> Result<(), AppError> {
    if start > end {
        return Err(AppError::with_message(
            ErrorCode::GroupInvalidPeriod,
            format!("start_month {start} is after end_month {end}"),
        )
        .with_detail("field", "end_month"));
    }
    Ok(())
}

fn group_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::GroupNotFound).with_detail("group_id", id)
}

fn month_taken(month: YearMonth) -> AppError {
    AppError::with_message(
        ErrorCode::SlotMonthTaken,
        format!("Month {month} is already assigned in this group"),
    )
    .with_detail("field", "assigned_month")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;
    use shared::models::{GroupStatus, PaymentStatus};

    fn form(start: &str, end: &str) -> GroupCreate {
        GroupCreate {
            name: "Kasmoni".into(),
            description: None,
            monthly_amount: 400.0,
            start_month: ym(start),
            end_month: ym(end),
        }
    }

    #[tokio::test]
    async fn test_create_validates_period_and_amount() {
        let pool = pool().await;
        let err = create(&pool, &admin(), form("2024-06", "2024-01")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GroupInvalidPeriod);

        let mut bad = form("2024-01", "2024-06");
        bad.monthly_amount = 0.0;
        let err = create(&pool, &admin(), bad).await.unwrap_err();
        assert_eq!(err.details.unwrap()["field"], "monthly_amount");

        let err = create(&pool, &member_user(None), form("2024-01", "2024-06"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert!(list(&pool, ym("2024-01")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slot_rules() {
        let pool = pool().await;
        let g = create(&pool, &admin(), form("2024-01", "2024-06")).await.unwrap();
        let a = add_member(&pool, "A", "S-1").await;
        let b = add_member(&pool, "B", "S-2").await;

        let slot_a = add_slot(
            &pool,
            &admin(),
            g.id,
            SlotCreate { member_id: a.id, assigned_month: ym("2024-02") },
        )
        .await
        .unwrap();

        let err = add_slot(&pool, &admin(), g.id, SlotCreate { member_id: b.id, assigned_month: ym("2024-02") })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SlotMonthTaken);

        let err = add_slot(&pool, &admin(), g.id, SlotCreate { member_id: b.id, assigned_month: ym("2024-07") })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SlotOutOfRange);

        member::delete(&pool, b.id).await.unwrap();
        let err = add_slot(&pool, &admin(), g.id, SlotCreate { member_id: b.id, assigned_month: ym("2024-03") })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberInactive);

        // Same member may hold several months
        add_slot(&pool, &admin(), g.id, SlotCreate { member_id: a.id, assigned_month: ym("2024-05") })
            .await
            .unwrap();

        let d = detail(&pool, g.id, ym("2024-03")).await.unwrap();
        assert_eq!(d.slots.len(), 2);
        assert_eq!(d.monthly_pot, 800.0);
        assert_eq!(d.status, GroupStatus::Active);

        let summaries = list(&pool, ym("2025-01")).await.unwrap();
        assert_eq!(summaries[0].slot_count, 2);
        assert_eq!(summaries[0].status, GroupStatus::Completed);

        // Group with slots cannot be deleted
        let err = delete(&pool, &admin(), g.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GroupHasSlots);

        // Period cannot shrink past assigned slots
        let err = update(
            &pool,
            &admin(),
            g.id,
            GroupUpdate { end_month: Some(ym("2024-04")), ..Default::default() },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::SlotOutOfRange);

        // Slot referenced by a payment cannot be removed
        let p = add_payment(&pool, a.id, g.id, "2024-02", 400.0, PaymentStatus::Pending).await;
        sqlx::query("UPDATE payments SET slot_id = ? WHERE id = ?")
            .bind(slot_a.id)
            .bind(p.id)
            .execute(&pool)
            .await
            .unwrap();
        let err = remove_slot(&pool, &admin(), slot_a.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SlotHasPayments);
    }

    #[tokio::test]
    async fn test_delete_empty_group() {
        let pool = pool().await;
        let g = create(&pool, &admin(), form("2024-01", "2024-06")).await.unwrap();
        assert!(delete(&pool, &admin(), g.id).await.unwrap());
        let err = detail(&pool, g.id, ym("2024-01")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GroupNotFound);
    }
}
