//! Payments
//!
//! Creation checks that the member holds a slot in the group. Status changes
//! follow [`PaymentStatus::can_transition_to`]; the update is a
//! compare-and-set on the previous status.

use shared::ErrorCode;
use shared::models::{Payment, PaymentCreate, PaymentFilter, PaymentStatus, PaymentStatusUpdate};
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::repository::{bank, group, member, payment, slot};
use crate::services::{ensure_admin, ensure_can_view_member};
use crate::utils::AppError;
use crate::utils::validation::{
    MAX_NOTE_LEN, normalize_optional, validate_id, validate_optional_date, validate_optional_text,
    validate_positive_amount,
};

/// Filtered list; non-admins are restricted to their own member id
pub async fn list(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    mut filter: PaymentFilter,
) -> Result<Vec<Payment>, AppError> {
    if !ctx.is_admin() {
        if let Some(requested) = filter.member_id {
            ensure_can_view_member(ctx, requested)?;
        }
        let own = ctx.member_id.ok_or_else(|| {
            AppError::permission_denied("No member record is linked to this account")
        })?;
        filter.member_id = Some(own);
    }
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(AppError::field("from", format!("from {from} is after to {to}")));
    }
    Ok(payment::find_filtered(pool, &filter).await?)
}

pub async fn get(pool: &SqlitePool, ctx: &CurrentUser, id: i64) -> Result<Payment, AppError> {
    validate_id(id, "payment_id")?;
    let found = payment::find_by_id(pool, id)
        .await?
        .ok_or_else(|| payment_not_found(id))?;
    ensure_can_view_member(ctx, found.member_id)?;
    Ok(found)
}

pub async fn create(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    payload: PaymentCreate,
) -> Result<Payment, AppError> {
    ensure_admin(ctx, "record payments")?;
    let payload = PaymentCreate {
        payment_date: normalize_optional(payload.payment_date),
        notes: normalize_optional(payload.notes),
        ..payload
    };

    validate_id(payload.member_id, "member_id")?;
    validate_id(payload.group_id, "group_id")?;
    validate_positive_amount(payload.amount, "amount")
        .map_err(|e| AppError { code: ErrorCode::PaymentInvalidAmount, ..e })?;
    validate_optional_date(&payload.payment_date, "payment_date")?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let status = payload.status.unwrap_or(PaymentStatus::Pending);
    if !matches!(status, PaymentStatus::Pending | PaymentStatus::Received) {
        return Err(AppError::field(
            "status",
            "A new payment starts as pending or received",
        ));
    }

    let (found_member, found_group, in_group) = tokio::try_join!(
        member::find_member_by_id(pool, payload.member_id),
        group::find_by_id(pool, payload.group_id),
        slot::member_in_group(pool, payload.group_id, payload.member_id),
    )?;
    if found_member.is_none() {
        return Err(AppError::new(ErrorCode::MemberNotFound).with_detail("member_id", payload.member_id));
    }
    if found_group.is_none() {
        return Err(AppError::new(ErrorCode::GroupNotFound).with_detail("group_id", payload.group_id));
    }
    if !in_group {
        return Err(AppError::new(ErrorCode::PaymentNoSlot)
            .with_detail("member_id", payload.member_id)
            .with_detail("group_id", payload.group_id));
    }

    if let Some(slot_id) = payload.slot_id {
        let matches = slot::find_by_id(pool, slot_id)
            .await?
            .is_some_and(|s| s.group_id == payload.group_id && s.member_id == payload.member_id);
        if !matches {
            return Err(AppError::new(ErrorCode::SlotNotFound)
                .with_detail("field", "slot_id")
                .with_detail("slot_id", slot_id));
        }
    }
    for (field, bank_id) in [
        ("sender_bank_id", payload.sender_bank_id),
        ("receiver_bank_id", payload.receiver_bank_id),
    ] {
        if let Some(id) = bank_id
            && bank::find_by_id(pool, id).await?.is_none()
        {
            return Err(AppError::new(ErrorCode::BankNotFound).with_detail("field", field));
        }
    }

    let created = payment::create(pool, &payload, status).await?;
    tracing::info!(
        payment_id = created.id,
        member_id = created.member_id,
        group_id = created.group_id,
        amount = created.amount,
        status = created.status.as_str(),
        actor = ctx.id,
        "Payment recorded"
    );
    Ok(created)
}

/// Move a payment to a new status
pub async fn update_status(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    id: i64,
    payload: PaymentStatusUpdate,
) -> Result<Payment, AppError> {
    ensure_admin(ctx, "update payment status")?;
    validate_id(id, "payment_id")?;
    let payment_date = normalize_optional(payload.payment_date);
    let notes = normalize_optional(payload.notes);
    validate_optional_date(&payment_date, "payment_date")?;
    validate_optional_text(&notes, "notes", MAX_NOTE_LEN)?;

    let current = payment::find_by_id(pool, id)
        .await?
        .ok_or_else(|| payment_not_found(id))?;
    let from = current.status;
    let to = payload.status;

    if !from.can_transition_to(to) {
        return Err(invalid_transition(from, to));
    }

    let applied =
        payment::update_status(pool, id, from, to, payment_date.as_deref(), notes.as_deref()).await?;
    if !applied {
        // Status changed between read and write
        let now = payment::find_by_id(pool, id)
            .await?
            .map(|p| p.status)
            .unwrap_or(from);
        return Err(invalid_transition(now, to));
    }

    tracing::info!(
        payment_id = id,
        from = from.as_str(),
        to = to.as_str(),
        actor = ctx.id,
        "Payment status changed"
    );
    payment::find_by_id(pool, id)
        .await?
        .ok_or_else(|| payment_not_found(id))
}

fn payment_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::PaymentNotFound).with_detail("payment_id", id)
}

fn invalid_transition(from: PaymentStatus, to: PaymentStatus) -> AppError {
    AppError::with_message(
        ErrorCode::PaymentInvalidTransition,
        format!("Cannot change payment from {} to {}", from.as_str(), to.as_str()),
    )
    .with_detail("from", from.as_str())
    .with_detail("to", to.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;
    use shared::models::PaymentKind;

    fn form(member_id: i64, group_id: i64, amount: f64) -> PaymentCreate {
        PaymentCreate {
            member_id,
            group_id,
            slot_id: None,
            amount,
            kind: PaymentKind::Contribution,
            status: None,
            payment_month: ym("2024-02"),
            payment_date: Some("2024-02-03".into()),
            sender_bank_id: None,
            receiver_bank_id: None,
            notes: Some("  ".into()),
        }
    }

    fn to(status: PaymentStatus) -> PaymentStatusUpdate {
        PaymentStatusUpdate { status, payment_date: None, notes: None }
    }

    #[tokio::test]
    async fn test_create_rules() {
        let pool = pool().await;
        let m = add_member(&pool, "P", "PAY-1").await;
        let outsider = add_member(&pool, "Q", "PAY-2").await;
        let g = add_group(&pool, 200.0, "2024-01", "2024-12").await;
        insert_slot(&pool, g, m.id, "2024-04").await;

        let created = create(&pool, &admin(), form(m.id, g, 200.0)).await.unwrap();
        assert_eq!(created.status, PaymentStatus::Pending);
        assert_eq!(created.notes, None);

        let err = create(&pool, &admin(), form(m.id, g, -1.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentInvalidAmount);

        let err = create(&pool, &admin(), form(outsider.id, g, 200.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNoSlot);

        let mut settled = form(m.id, g, 200.0);
        settled.status = Some(PaymentStatus::Settled);
        let err = create(&pool, &admin(), settled).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = create(&pool, &member_user(Some(m.id)), form(m.id, g, 200.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert_eq!(payment::find_by_member(&pool, m.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let pool = pool().await;
        let m = add_member(&pool, "P", "PAY-3").await;
        let g = add_group(&pool, 200.0, "2024-01", "2024-12").await;
        insert_slot(&pool, g, m.id, "2024-04").await;
        let p = create(&pool, &admin(), form(m.id, g, 200.0)).await.unwrap();

        let received = update_status(&pool, &admin(), p.id, to(PaymentStatus::Received))
            .await
            .unwrap();
        assert_eq!(received.status, PaymentStatus::Received);

        let err = update_status(&pool, &admin(), p.id, to(PaymentStatus::Pending))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentInvalidTransition);

        update_status(&pool, &admin(), p.id, to(PaymentStatus::Settled))
            .await
            .unwrap();
        let err = update_status(&pool, &admin(), p.id, to(PaymentStatus::Cancelled))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentInvalidTransition);

        let err = update_status(&pool, &admin(), 777, to(PaymentStatus::Received))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNotFound);
    }

    #[tokio::test]
    async fn test_member_sees_only_own_payments() {
        let pool = pool().await;
        let a = add_member(&pool, "A", "PAY-4").await;
        let b = add_member(&pool, "B", "PAY-5").await;
        let g = add_group(&pool, 100.0, "2024-01", "2024-12").await;
        add_payment(&pool, a.id, g, "2024-01", 100.0, PaymentStatus::Pending).await;
        let pb = add_payment(&pool, b.id, g, "2024-01", 100.0, PaymentStatus::Pending).await;

        let own = list(&pool, &member_user(Some(a.id)), PaymentFilter::default()).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].member_id, a.id);

        let err = list(
            &pool,
            &member_user(Some(a.id)),
            PaymentFilter { member_id: Some(b.id), ..Default::default() },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = get(&pool, &member_user(Some(a.id)), pb.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        assert_eq!(list(&pool, &admin(), PaymentFilter::default()).await.unwrap().len(), 2);
    }
}
