//! Member Service
//!
//! Validation and role checks in front of the member repository. Writes are
//! admin-only: the role check runs first, so a refused call never reaches the
//! database.

use shared::ErrorCode;
use shared::models::{MemberCreate, MemberUpdate, MemberWithBank, Payment, SlotWithGroup};
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::repository::{RepoError, bank, member, payment, slot};
use crate::services::{ensure_admin, ensure_can_view_member};
use crate::utils::AppError;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, normalize_optional, validate_id,
    validate_optional_date, validate_optional_email, validate_optional_text,
    validate_required_text,
};

pub async fn list(pool: &SqlitePool, ctx: &CurrentUser) -> Result<Vec<MemberWithBank>, AppError> {
    ensure_admin(ctx, "list members")?;
    Ok(member::find_all(pool).await?)
}

pub async fn search(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    query: &str,
) -> Result<Vec<MemberWithBank>, AppError> {
    ensure_admin(ctx, "search members")?;
    let query = query.trim();
    if query.is_empty() {
        return Ok(member::find_all(pool).await?);
    }
    Ok(member::search(pool, query).await?)
}

pub async fn get(pool: &SqlitePool, ctx: &CurrentUser, id: i64) -> Result<MemberWithBank, AppError> {
    validate_id(id, "member_id")?;
    ensure_can_view_member(ctx, id)?;
    member::find_by_id(pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn create(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    payload: MemberCreate,
) -> Result<MemberWithBank, AppError> {
    ensure_admin(ctx, "create members")?;
    let payload = normalize_create(payload);
    validate_create(&payload)?;
    if let Some(bank_id) = payload.bank_id {
        ensure_bank_exists(pool, bank_id).await?;
    }

    let created = member::create(pool, payload).await.map_err(map_duplicate)?;
    tracing::info!(member_id = created.id, actor = ctx.id, "Member created");
    Ok(created)
}

pub async fn update(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    id: i64,
    payload: MemberUpdate,
) -> Result<MemberWithBank, AppError> {
    ensure_admin(ctx, "update members")?;
    validate_id(id, "member_id")?;
    let payload = normalize_update(payload);
    validate_update(&payload)?;
    if let Some(bank_id) = payload.bank_id {
        ensure_bank_exists(pool, bank_id).await?;
    }

    let updated = member::update(pool, id, payload).await.map_err(|e| match e {
        RepoError::NotFound(_) => not_found(id),
        other => map_duplicate(other),
    })?;
    tracing::info!(member_id = id, actor = ctx.id, "Member updated");
    Ok(updated)
}

/// Soft delete; returns `false` if the member was already inactive
pub async fn delete(pool: &SqlitePool, ctx: &CurrentUser, id: i64) -> Result<bool, AppError> {
    ensure_admin(ctx, "delete members")?;
    validate_id(id, "member_id")?;
    if member::find_member_by_id(pool, id).await?.is_none() {
        return Err(not_found(id));
    }
    let deleted = member::delete(pool, id).await?;
    if deleted {
        tracing::info!(member_id = id, actor = ctx.id, "Member deactivated");
    }
    Ok(deleted)
}

pub async fn slots_of(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    id: i64,
) -> Result<Vec<SlotWithGroup>, AppError> {
    validate_id(id, "member_id")?;
    ensure_can_view_member(ctx, id)?;
    ensure_member_exists(pool, id).await?;
    Ok(slot::find_by_member(pool, id).await?)
}

pub async fn payments_of(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    id: i64,
) -> Result<Vec<Payment>, AppError> {
    validate_id(id, "member_id")?;
    ensure_can_view_member(ctx, id)?;
    ensure_member_exists(pool, id).await?;
    Ok(payment::find_by_member(pool, id).await?)
}

// ── Validation ──────────────────────────────────────────────────────

pub(crate) fn validate_create(p: &MemberCreate) -> Result<(), AppError> {
    validate_required_text(&p.first_name, "first_name", MAX_NAME_LEN)?;
    validate_required_text(&p.last_name, "last_name", MAX_NAME_LEN)?;
    validate_required_text(&p.national_id, "national_id", MAX_SHORT_TEXT_LEN)?;
    validate_optional_date(&p.birth_date, "birth_date")?;
    validate_optional_text(&p.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_email(&p.email, "email")?;
    validate_optional_text(&p.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&p.account_number, "account_number", MAX_SHORT_TEXT_LEN)?;
    Ok(())
}

fn validate_update(p: &MemberUpdate) -> Result<(), AppError> {
    if let Some(v) = &p.first_name {
        validate_required_text(v, "first_name", MAX_NAME_LEN)?;
    }
    if let Some(v) = &p.last_name {
        validate_required_text(v, "last_name", MAX_NAME_LEN)?;
    }
    if let Some(v) = &p.national_id {
        validate_required_text(v, "national_id", MAX_SHORT_TEXT_LEN)?;
    }
    validate_optional_date(&p.birth_date, "birth_date")?;
    validate_optional_text(&p.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_email(&p.email, "email")?;
    validate_optional_text(&p.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&p.account_number, "account_number", MAX_SHORT_TEXT_LEN)?;
    Ok(())
}

pub(crate) fn normalize_create(p: MemberCreate) -> MemberCreate {
    MemberCreate {
        first_name: p.first_name.trim().to_string(),
        last_name: p.last_name.trim().to_string(),
        national_id: p.national_id.trim().to_string(),
        birth_date: normalize_optional(p.birth_date),
        phone: normalize_optional(p.phone),
        email: normalize_optional(p.email),
        address: normalize_optional(p.address),
        bank_id: p.bank_id,
        account_number: normalize_optional(p.account_number),
    }
}

fn normalize_update(p: MemberUpdate) -> MemberUpdate {
    MemberUpdate {
        first_name: p.first_name.map(|v| v.trim().to_string()),
        last_name: p.last_name.map(|v| v.trim().to_string()),
        national_id: p.national_id.map(|v| v.trim().to_string()),
        birth_date: normalize_optional(p.birth_date),
        phone: normalize_optional(p.phone),
        email: normalize_optional(p.email),
        address: normalize_optional(p.address),
        bank_id: p.bank_id,
        account_number: normalize_optional(p.account_number),
        is_active: p.is_active,
    }
}

async fn ensure_bank_exists(pool: &SqlitePool, bank_id: i64) -> Result<(), AppError> {
    if bank::find_by_id(pool, bank_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::BankNotFound)
            .with_detail("field", "bank_id")
            .with_detail("bank_id", bank_id));
    }
    Ok(())
}

async fn ensure_member_exists(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    if member::find_member_by_id(pool, id).await?.is_none() {
        return Err(not_found(id));
    }
    Ok(())
}

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::MemberNotFound).with_detail("member_id", id)
}

pub(crate) fn map_duplicate(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::MemberNationalIdExists)
            .with_detail("field", "national_id"),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;

    #[tokio::test]
    async fn test_admin_create_and_get() {
        let pool = pool().await;
        let created = create(&pool, &admin(), member_form("  Maya ", "N-1")).await.unwrap();
        assert_eq!(created.first_name, "Maya");

        let fetched = get(&pool, &admin(), created.id).await.unwrap();
        assert_eq!(fetched, created);

        // Own record is visible to the linked member
        assert!(get(&pool, &member_user(Some(created.id)), created.id).await.is_ok());
        let err = get(&pool, &member_user(None), created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_non_admin_create_mutates_nothing() {
        let pool = pool().await;
        let err = create(&pool, &member_user(None), member_form("Eve", "N-2"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert_eq!(err.message, "Only administrators can perform this action");
        assert_eq!(member::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_admin_delete_mutates_nothing() {
        let pool = pool().await;
        let m = add_member(&pool, "Kees", "N-3").await;

        let err = delete(&pool, &member_user(Some(m.id)), m.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert!(err.details.unwrap().contains_key("action"));

        let still = member::find_member_by_id(&pool, m.id).await.unwrap().unwrap();
        assert!(still.is_active);

        let err = update(
            &pool,
            &member_user(Some(m.id)),
            m.id,
            MemberUpdate {
                first_name: Some("Hacked".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        let unchanged = member::find_member_by_id(&pool, m.id).await.unwrap().unwrap();
        assert_eq!(unchanged.first_name, "Kees");
    }

    #[tokio::test]
    async fn test_validation_blocks_write() {
        let pool = pool().await;
        let mut form = member_form("", "N-4");
        let err = create(&pool, &admin(), form.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.unwrap()["field"], "first_name");

        form.first_name = "Ok".into();
        form.email = Some("not-an-email".into());
        let err = create(&pool, &admin(), form).await.unwrap_err();
        assert_eq!(err.details.unwrap()["field"], "email");

        assert_eq!(member::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_national_id_and_unknown_bank() {
        let pool = pool().await;
        create(&pool, &admin(), member_form("A", "N-5")).await.unwrap();
        let err = create(&pool, &admin(), member_form("B", "N-5")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberNationalIdExists);

        let mut form = member_form("C", "N-6");
        form.bank_id = Some(12345);
        let err = create(&pool, &admin(), form).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BankNotFound);
    }

    #[tokio::test]
    async fn test_delete_is_soft() {
        let pool = pool().await;
        let m = add_member(&pool, "Zoe", "N-7").await;
        assert!(delete(&pool, &admin(), m.id).await.unwrap());
        assert!(!delete(&pool, &admin(), m.id).await.unwrap());
        assert!(list(&pool, &admin()).await.unwrap().is_empty());
        // History stays reachable
        assert!(!get(&pool, &admin(), m.id).await.unwrap().is_active);

        let err = delete(&pool, &admin(), 424242).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberNotFound);
    }
}
