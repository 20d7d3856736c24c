//! Savings Group Repository

use super::{RepoError, RepoResult};
use shared::models::{Group, GroupCreate, GroupUpdate};
use sqlx::SqlitePool;

const GROUP_SELECT: &str = "SELECT id, name, description, monthly_amount, start_month, end_month, created_at, updated_at FROM savings_groups";

/// All groups, latest start first
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Group>> {
    let sql = format!("{} ORDER BY start_month DESC, name", GROUP_SELECT);
    let rows = sqlx::query_as::<_, Group>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Group>> {
    let sql = format!("{} WHERE id = ?", GROUP_SELECT);
    let row = sqlx::query_as::<_, Group>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: GroupCreate) -> RepoResult<Group> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO savings_groups (id, name, description, monthly_amount, start_month, end_month, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.monthly_amount)
    .bind(data.start_month)
    .bind(data.end_month)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create group".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: GroupUpdate) -> RepoResult<Group> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE savings_groups SET name = COALESCE(?1, name), description = COALESCE(?2, description), monthly_amount = COALESCE(?3, monthly_amount), start_month = COALESCE(?4, start_month), end_month = COALESCE(?5, end_month), updated_at = ?6 WHERE id = ?7",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.monthly_amount)
    .bind(data.start_month)
    .bind(data.end_month)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Group {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Group {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM savings_groups WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn ym(s: &str) -> shared::YearMonth {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_group_crud() {
        let db = DbService::in_memory().await.unwrap();
        let pool = &db.pool;

        let group = create(
            pool,
            GroupCreate {
                name: "Kasmoni 2024".into(),
                description: None,
                monthly_amount: 1000.0,
                start_month: ym("2024-01"),
                end_month: ym("2024-12"),
            },
        )
        .await
        .unwrap();
        assert_eq!(group.start_month, ym("2024-01"));
        assert_eq!(group.duration_months(), 12);

        let updated = update(
            pool,
            group.id,
            GroupUpdate {
                monthly_amount: Some(1250.5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.monthly_amount, 1250.5);
        assert_eq!(updated.name, "Kasmoni 2024");

        assert_eq!(find_all(pool).await.unwrap().len(), 1);
        assert!(delete(pool, group.id).await.unwrap());
        assert!(find_by_id(pool, group.id).await.unwrap().is_none());
    }
}
