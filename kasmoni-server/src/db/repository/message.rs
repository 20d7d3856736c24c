//! Message Repository

use super::{RepoError, RepoResult};
use shared::models::{Message, MessageCreate};
use sqlx::SqlitePool;

const MESSAGE_SELECT: &str = "SELECT id, sender_id, member_id, subject, body, is_read, created_at FROM messages";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Message>> {
    let sql = format!("{} ORDER BY created_at DESC, id DESC", MESSAGE_SELECT);
    let rows = sqlx::query_as::<_, Message>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Messages addressed to the member plus broadcasts
pub async fn find_for_member(pool: &SqlitePool, member_id: i64) -> RepoResult<Vec<Message>> {
    let sql = format!(
        "{} WHERE member_id = ? OR member_id IS NULL ORDER BY created_at DESC, id DESC",
        MESSAGE_SELECT
    );
    let rows = sqlx::query_as::<_, Message>(&sql)
        .bind(member_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Broadcasts only (callers without a linked member record)
pub async fn find_broadcasts(pool: &SqlitePool) -> RepoResult<Vec<Message>> {
    let sql = format!(
        "{} WHERE member_id IS NULL ORDER BY created_at DESC, id DESC",
        MESSAGE_SELECT
    );
    let rows = sqlx::query_as::<_, Message>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Message>> {
    let sql = format!("{} WHERE id = ?", MESSAGE_SELECT);
    let row = sqlx::query_as::<_, Message>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, sender_id: i64, data: &MessageCreate) -> RepoResult<Message> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO messages (id, sender_id, member_id, subject, body, is_read, created_at) VALUES (?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(id)
    .bind(sender_id)
    .bind(data.member_id)
    .bind(&data.subject)
    .bind(&data.body)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create message".into()))
}

pub async fn mark_read(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE messages SET is_read = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
