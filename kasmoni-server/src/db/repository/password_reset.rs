//! Password reset request Repository

use super::{RepoError, RepoResult};
use shared::models::{PasswordResetRequest, ResetStatus};
use sqlx::SqlitePool;

const RESET_SELECT: &str = "SELECT id, user_id, email, status, resolved_by, created_at, resolved_at FROM password_reset_requests";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<PasswordResetRequest>> {
    let sql = format!("{} ORDER BY created_at DESC, id DESC", RESET_SELECT);
    let rows = sqlx::query_as::<_, PasswordResetRequest>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PasswordResetRequest>> {
    let sql = format!("{} WHERE id = ?", RESET_SELECT);
    let row = sqlx::query_as::<_, PasswordResetRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    email: &str,
    user_id: Option<i64>,
) -> RepoResult<PasswordResetRequest> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO password_reset_requests (id, user_id, email, status, created_at) VALUES (?, ?, ?, 'pending', ?)",
    )
    .bind(id)
    .bind(user_id)
    .bind(email)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create reset request".into()))
}

/// Close a pending request; returns `false` if it was no longer pending
pub async fn close(
    pool: &SqlitePool,
    id: i64,
    status: ResetStatus,
    resolved_by: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE password_reset_requests SET status = ?, resolved_by = ?, resolved_at = ? WHERE id = ? AND status = 'pending'",
    )
    .bind(status)
    .bind(resolved_by)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
