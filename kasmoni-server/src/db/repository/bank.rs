//! Bank Repository

use super::{RepoError, RepoResult};
use shared::models::{Bank, BankCreate, BankUpdate};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Bank>> {
    let rows = sqlx::query_as::<_, Bank>(
        "SELECT id, name, short_name, created_at FROM banks ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Bank>> {
    let row = sqlx::query_as::<_, Bank>(
        "SELECT id, name, short_name, created_at FROM banks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Case-insensitive lookup by full or short name (CSV import)
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Bank>> {
    let row = sqlx::query_as::<_, Bank>(
        "SELECT id, name, short_name, created_at FROM banks WHERE name = ?1 COLLATE NOCASE OR short_name = ?1 COLLATE NOCASE LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: BankCreate) -> RepoResult<Bank> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query("INSERT INTO banks (id, name, short_name, created_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(&data.name)
        .bind(&data.short_name)
        .bind(now)
        .execute(pool)
        .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create bank".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: BankUpdate) -> RepoResult<Bank> {
    let rows = sqlx::query(
        "UPDATE banks SET name = COALESCE(?1, name), short_name = COALESCE(?2, short_name) WHERE id = ?3",
    )
    .bind(&data.name)
    .bind(&data.short_name)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Bank {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Bank {id} not found")))
}

/// Number of members and payments referencing the bank
pub async fn usage_count(pool: &SqlitePool, id: i64) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM members WHERE bank_id = ?1) + (SELECT COUNT(*) FROM payments WHERE sender_bank_id = ?1 OR receiver_bank_id = ?1)",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM banks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_bank_crud_and_lookup() {
        let db = DbService::in_memory().await.unwrap();
        let pool = &db.pool;

        let bank = create(
            pool,
            BankCreate {
                name: "De Surinaamsche Bank".into(),
                short_name: Some("DSB".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(find_by_name(pool, "dsb").await.unwrap().unwrap().id, bank.id);
        assert_eq!(
            find_by_name(pool, "de surinaamsche bank").await.unwrap().unwrap().id,
            bank.id
        );
        assert!(find_by_name(pool, "Hakrinbank").await.unwrap().is_none());

        let renamed = update(
            pool,
            bank.id,
            BankUpdate {
                name: Some("DSB Bank".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "DSB Bank");
        assert_eq!(renamed.short_name.as_deref(), Some("DSB"));

        assert_eq!(usage_count(pool, bank.id).await.unwrap(), 0);
        assert!(delete(pool, bank.id).await.unwrap());
        assert!(find_all(pool).await.unwrap().is_empty());
    }
}
