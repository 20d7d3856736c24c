//! Payment Repository

use super::{RepoError, RepoResult};
use shared::YearMonth;
use shared::models::{Payment, PaymentCreate, PaymentFilter, PaymentStatus};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const PAYMENT_SELECT: &str = "SELECT id, member_id, group_id, slot_id, amount, kind, status, payment_month, payment_date, sender_bank_id, receiver_bank_id, notes, created_at, updated_at FROM payments";

const PAYMENT_ORDER: &str = " ORDER BY payment_month DESC, created_at DESC, id DESC";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{} WHERE id = ?", PAYMENT_SELECT);
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Payments matching every set filter field, newest month first
pub async fn find_filtered(pool: &SqlitePool, filter: &PaymentFilter) -> RepoResult<Vec<Payment>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(PAYMENT_SELECT);
    qb.push(" WHERE 1 = 1");
    if let Some(member_id) = filter.member_id {
        qb.push(" AND member_id = ").push_bind(member_id);
    }
    if let Some(group_id) = filter.group_id {
        qb.push(" AND group_id = ").push_bind(group_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filter.from {
        qb.push(" AND payment_month >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND payment_month <= ").push_bind(to);
    }
    qb.push(PAYMENT_ORDER);

    let rows = qb.build_query_as::<Payment>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_member(pool: &SqlitePool, member_id: i64) -> RepoResult<Vec<Payment>> {
    let sql = format!("{} WHERE member_id = ?{}", PAYMENT_SELECT, PAYMENT_ORDER);
    let rows = sqlx::query_as::<_, Payment>(&sql)
        .bind(member_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every payment (bulk status aggregation)
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Payment>> {
    let sql = format!("{}{}", PAYMENT_SELECT, PAYMENT_ORDER);
    let rows = sqlx::query_as::<_, Payment>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn count_for_slot(pool: &SqlitePool, slot_id: i64) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE slot_id = ?")
        .bind(slot_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn create(pool: &SqlitePool, data: &PaymentCreate, status: PaymentStatus) -> RepoResult<Payment> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO payments (id, member_id, group_id, slot_id, amount, kind, status, payment_month, payment_date, sender_bank_id, receiver_bank_id, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
    )
    .bind(id)
    .bind(data.member_id)
    .bind(data.group_id)
    .bind(data.slot_id)
    .bind(data.amount)
    .bind(data.kind)
    .bind(status)
    .bind(data.payment_month)
    .bind(&data.payment_date)
    .bind(data.sender_bank_id)
    .bind(data.receiver_bank_id)
    .bind(&data.notes)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create payment".into()))
}

/// Compare-and-set status change: only applies while the row still has `from`
///
/// Returns `false` when the row was concurrently moved to another status.
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
    payment_date: Option<&str>,
    notes: Option<&str>,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE payments SET status = ?1, payment_date = COALESCE(?2, payment_date), notes = COALESCE(?3, notes), updated_at = ?4 WHERE id = ?5 AND status = ?6",
    )
    .bind(to)
    .bind(payment_date)
    .bind(notes)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

// ── Aggregates (analytics) ──────────────────────────────────────────

/// One collected (received/settled) payment, keyed by a bank column
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectedByBank {
    pub bank_id: Option<i64>,
    pub bank_name: Option<String>,
    pub amount: f64,
}

/// Collected payments with their receiving bank
pub async fn collected_by_receiver_bank(pool: &SqlitePool) -> RepoResult<Vec<CollectedByBank>> {
    collected_by_bank_column(pool, "receiver_bank_id").await
}

/// Collected payments with their sending bank
pub async fn collected_by_sender_bank(pool: &SqlitePool) -> RepoResult<Vec<CollectedByBank>> {
    collected_by_bank_column(pool, "sender_bank_id").await
}

// Amounts are summed by the caller in Decimal, not as SQLite REAL
async fn collected_by_bank_column(
    pool: &SqlitePool,
    column: &'static str,
) -> RepoResult<Vec<CollectedByBank>> {
    let sql = format!(
        "SELECT p.{column} AS bank_id, b.name AS bank_name, p.amount AS amount FROM payments p LEFT JOIN banks b ON p.{column} = b.id WHERE p.status IN ('received', 'settled') ORDER BY p.id"
    );
    let rows = sqlx::query_as::<_, CollectedByBank>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Collected contribution amounts with their month, within `[from, to]`
pub async fn collected_in_months(
    pool: &SqlitePool,
    from: YearMonth,
    to: YearMonth,
) -> RepoResult<Vec<(YearMonth, f64)>> {
    let rows = sqlx::query_as::<_, (YearMonth, f64)>(
        "SELECT payment_month, amount FROM payments WHERE kind = 'contribution' AND status IN ('received', 'settled') AND payment_month >= ? AND payment_month <= ? ORDER BY payment_month, id",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
