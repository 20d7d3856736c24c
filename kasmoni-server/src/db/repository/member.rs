//! Member Repository

use super::{RepoError, RepoResult};
use shared::models::{Member, MemberCreate, MemberUpdate, MemberWithBank};
use sqlx::SqlitePool;

const MEMBER_WITH_BANK_SELECT: &str = "SELECT m.id, m.first_name, m.last_name, m.national_id, m.birth_date, m.phone, m.email, m.address, m.bank_id, b.name AS bank_name, m.account_number, m.is_active, m.created_at, m.updated_at FROM members m LEFT JOIN banks b ON m.bank_id = b.id";

const MEMBER_SELECT: &str = "SELECT id, first_name, last_name, national_id, birth_date, phone, email, address, bank_id, account_number, is_active, created_at, updated_at FROM members";

/// Active members, newest first (the list view order)
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<MemberWithBank>> {
    let sql = format!(
        "{} WHERE m.is_active = 1 ORDER BY m.created_at DESC, m.id DESC",
        MEMBER_WITH_BANK_SELECT
    );
    let rows = sqlx::query_as::<_, MemberWithBank>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MemberWithBank>> {
    let sql = format!("{} WHERE m.id = ?", MEMBER_WITH_BANK_SELECT);
    let row = sqlx::query_as::<_, MemberWithBank>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Plain member row regardless of `is_active`
pub async fn find_member_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Member>> {
    let sql = format!("{} WHERE id = ?", MEMBER_SELECT);
    let row = sqlx::query_as::<_, Member>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_national_id(pool: &SqlitePool, national_id: &str) -> RepoResult<Option<Member>> {
    let sql = format!("{} WHERE national_id = ?", MEMBER_SELECT);
    let row = sqlx::query_as::<_, Member>(&sql)
        .bind(national_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn search(pool: &SqlitePool, query: &str) -> RepoResult<Vec<MemberWithBank>> {
    let pattern = format!("%{query}%");
    let sql = format!(
        "{} WHERE m.is_active = 1 AND (m.first_name LIKE ?1 OR m.last_name LIKE ?1 OR m.national_id LIKE ?1 OR m.phone LIKE ?1 OR m.email LIKE ?1) ORDER BY m.created_at DESC, m.id DESC",
        MEMBER_WITH_BANK_SELECT
    );
    let rows = sqlx::query_as::<_, MemberWithBank>(&sql)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: MemberCreate) -> RepoResult<MemberWithBank> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO members (id, first_name, last_name, national_id, birth_date, phone, email, address, bank_id, account_number, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)",
    )
    .bind(id)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.national_id)
    .bind(&data.birth_date)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.address)
    .bind(data.bank_id)
    .bind(&data.account_number)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create member".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: MemberUpdate) -> RepoResult<MemberWithBank> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE members SET first_name = COALESCE(?1, first_name), last_name = COALESCE(?2, last_name), national_id = COALESCE(?3, national_id), birth_date = COALESCE(?4, birth_date), phone = COALESCE(?5, phone), email = COALESCE(?6, email), address = COALESCE(?7, address), bank_id = COALESCE(?8, bank_id), account_number = COALESCE(?9, account_number), is_active = COALESCE(?10, is_active), updated_at = ?11 WHERE id = ?12",
    )
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.national_id)
    .bind(&data.birth_date)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.address)
    .bind(data.bank_id)
    .bind(&data.account_number)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Member {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))
}

/// Soft delete (sets `is_active = 0`)
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE members SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE is_active = 1")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn sample(national_id: &str) -> MemberCreate {
        MemberCreate {
            first_name: "Anita".into(),
            last_name: "Kromo".into(),
            national_id: national_id.into(),
            phone: Some("+597 812 3456".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_find_update_delete() {
        let db = DbService::in_memory().await.unwrap();
        let pool = &db.pool;

        let created = create(pool, sample("FB-001")).await.unwrap();
        assert!(created.id > 0);
        assert!(created.is_active);
        assert_eq!(created.bank_name, None);

        let updated = update(
            pool,
            created.id,
            MemberUpdate {
                last_name: Some("Kromodikoro".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.last_name, "Kromodikoro");
        assert_eq!(updated.first_name, "Anita");

        assert_eq!(search(pool, "dikoro").await.unwrap().len(), 1);
        assert_eq!(count(pool).await.unwrap(), 1);

        assert!(delete(pool, created.id).await.unwrap());
        assert!(!delete(pool, created.id).await.unwrap());
        assert!(find_all(pool).await.unwrap().is_empty());
        // Soft delete keeps the row
        let row = find_member_by_id(pool, created.id).await.unwrap().unwrap();
        assert!(!row.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_national_id() {
        let db = DbService::in_memory().await.unwrap();
        create(&db.pool, sample("FB-002")).await.unwrap();
        let err = create(&db.pool, sample("FB-002")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_update_missing_member() {
        let db = DbService::in_memory().await.unwrap();
        let err = update(&db.pool, 42, MemberUpdate::default()).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
