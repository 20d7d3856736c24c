//! Authentication log Repository

use super::RepoResult;
use shared::models::{AuthLog, AuthLogCreate};
use sqlx::SqlitePool;

pub async fn insert(pool: &SqlitePool, data: &AuthLogCreate) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO auth_logs (id, user_id, email, event, success, detail, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(data.user_id)
    .bind(&data.email)
    .bind(&data.event)
    .bind(data.success)
    .bind(&data.detail)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest first
pub async fn find_recent(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<AuthLog>> {
    let rows = sqlx::query_as::<_, AuthLog>(
        "SELECT id, user_id, email, event, success, detail, created_at FROM auth_logs ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Whether the user already has a successful session record
pub async fn has_accepted_token(pool: &SqlitePool, user_id: i64) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM auth_logs WHERE user_id = ? AND event = 'token_accepted'",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}
