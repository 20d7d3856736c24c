//! Slot Repository (`group_members` table)

use super::{RepoError, RepoResult};
use shared::YearMonth;
use shared::models::{Slot, SlotWithGroup, SlotWithMember};
use sqlx::SqlitePool;

const SLOT_WITH_GROUP_SELECT: &str = "SELECT s.id, s.group_id, s.member_id, s.assigned_month, g.name AS group_name, g.monthly_amount FROM group_members s JOIN savings_groups g ON s.group_id = g.id";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Slot>> {
    let row = sqlx::query_as::<_, Slot>(
        "SELECT id, group_id, member_id, assigned_month, created_at FROM group_members WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Slots of one member joined with their group's contribution
pub async fn find_by_member(pool: &SqlitePool, member_id: i64) -> RepoResult<Vec<SlotWithGroup>> {
    let sql = format!(
        "{} WHERE s.member_id = ? ORDER BY s.assigned_month",
        SLOT_WITH_GROUP_SELECT
    );
    let rows = sqlx::query_as::<_, SlotWithGroup>(&sql)
        .bind(member_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every slot joined with its group (bulk status aggregation)
pub async fn find_all_with_group(pool: &SqlitePool) -> RepoResult<Vec<SlotWithGroup>> {
    let sql = format!("{} ORDER BY s.member_id, s.assigned_month", SLOT_WITH_GROUP_SELECT);
    let rows = sqlx::query_as::<_, SlotWithGroup>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Slots of one group joined with member names, in payout order
pub async fn find_by_group(pool: &SqlitePool, group_id: i64) -> RepoResult<Vec<SlotWithMember>> {
    let rows = sqlx::query_as::<_, SlotWithMember>(
        "SELECT s.id, s.group_id, s.member_id, s.assigned_month, m.first_name, m.last_name FROM group_members s JOIN members m ON s.member_id = m.id WHERE s.group_id = ? ORDER BY s.assigned_month",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_group_month(
    pool: &SqlitePool,
    group_id: i64,
    month: YearMonth,
) -> RepoResult<Option<Slot>> {
    let row = sqlx::query_as::<_, Slot>(
        "SELECT id, group_id, member_id, assigned_month, created_at FROM group_members WHERE group_id = ? AND assigned_month = ?",
    )
    .bind(group_id)
    .bind(month)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Whether the member holds at least one slot in the group
pub async fn member_in_group(pool: &SqlitePool, group_id: i64, member_id: i64) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM group_members WHERE group_id = ? AND member_id = ?",
    )
    .bind(group_id)
    .bind(member_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// `(group_id, slot_count)` pairs for groups with at least one slot
pub async fn count_by_group(pool: &SqlitePool) -> RepoResult<Vec<(i64, i64)>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT group_id, COUNT(*) FROM group_members GROUP BY group_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_for_group(pool: &SqlitePool, group_id: i64) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = ?")
        .bind(group_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Earliest and latest assigned month in the group
pub async fn month_bounds(
    pool: &SqlitePool,
    group_id: i64,
) -> RepoResult<Option<(YearMonth, YearMonth)>> {
    let row = sqlx::query_as::<_, (Option<YearMonth>, Option<YearMonth>)>(
        "SELECT MIN(assigned_month), MAX(assigned_month) FROM group_members WHERE group_id = ?",
    )
    .bind(group_id)
    .fetch_one(pool)
    .await?;
    Ok(match row {
        (Some(min), Some(max)) => Some((min, max)),
        _ => None,
    })
}

pub async fn create(
    pool: &SqlitePool,
    group_id: i64,
    member_id: i64,
    month: YearMonth,
) -> RepoResult<Slot> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO group_members (id, group_id, member_id, assigned_month, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(group_id)
    .bind(member_id)
    .bind(month)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create slot".into()))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM group_members WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
