//! Dashboard analytics
//!
//! Every figure is derived from current rows at request time; nothing is
//! cached. Independent queries run concurrently.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use shared::YearMonth;
use shared::models::{GroupStatus, PaymentKind, PaymentStatus};
use shared::util::{sum_money, to_decimal, to_f64};
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::repository::payment::CollectedByBank;
use crate::db::repository::{group, member, payment, slot};
use crate::services::ensure_admin;
use crate::services::member_status::statuses_from_rows;
use crate::utils::AppError;
use crate::utils::time::trailing_months;

/// Upper bound for the trend window
pub const MAX_TREND_MONTHS: u32 = 24;

/// Headline figures for the current month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Overview {
    pub month: YearMonth,
    pub total_members: i64,
    pub active_members: i64,
    pub total_groups: i64,
    pub active_groups: i64,
    /// Σ monthly amount of every slot in an active group
    pub expected_this_month: f64,
    /// Received or settled contributions booked for this month
    pub collected_this_month: f64,
    pub pending_payments: i64,
    /// expected minus collected, never negative
    pub outstanding_this_month: f64,
}

/// Collected total for one bank; `bank_id` is `None` for payments without a bank
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BankTotalRow {
    pub bank_id: Option<i64>,
    pub bank_name: Option<String>,
    pub total_amount: f64,
    pub payment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankTotals {
    pub by_receiver_bank: Vec<BankTotalRow>,
    pub by_sender_bank: Vec<BankTotalRow>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub month: YearMonth,
    pub collected: f64,
}

pub async fn overview(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    now: YearMonth,
) -> Result<Overview, AppError> {
    ensure_admin(ctx, "view analytics")?;

    let (members, groups, slots, payments) = tokio::try_join!(
        member::find_all(pool),
        group::find_all(pool),
        slot::find_all_with_group(pool),
        payment::find_all(pool),
    )?;
    let statuses = statuses_from_rows(&members, &slots, &payments, now);

    let active_groups: HashSet<i64> = groups
        .iter()
        .filter(|g| g.status_at(now) == GroupStatus::Active)
        .map(|g| g.id)
        .collect();

    let expected = sum_money(
        slots
            .iter()
            .filter(|s| active_groups.contains(&s.group_id))
            .map(|s| s.monthly_amount),
    );
    let collected = sum_money(
        payments
            .iter()
            .filter(|p| {
                p.kind == PaymentKind::Contribution
                    && p.status.is_collected()
                    && p.payment_month == now
            })
            .map(|p| p.amount),
    );
    let outstanding = (to_decimal(expected) - to_decimal(collected)).max(Decimal::ZERO);

    Ok(Overview {
        month: now,
        total_members: statuses.len() as i64,
        active_members: statuses.iter().filter(|s| s.is_active).count() as i64,
        total_groups: groups.len() as i64,
        active_groups: active_groups.len() as i64,
        expected_this_month: expected,
        collected_this_month: collected,
        pending_payments: payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .count() as i64,
        outstanding_this_month: to_f64(outstanding),
    })
}

/// Collected totals per receiving and sending bank
pub async fn bank_totals(pool: &SqlitePool, ctx: &CurrentUser) -> Result<BankTotals, AppError> {
    ensure_admin(ctx, "view analytics")?;
    let (receiver_rows, sender_rows) = tokio::try_join!(
        payment::collected_by_receiver_bank(pool),
        payment::collected_by_sender_bank(pool),
    )?;
    Ok(BankTotals {
        by_receiver_bank: totals_per_bank(receiver_rows),
        by_sender_bank: totals_per_bank(sender_rows),
    })
}

/// Sum collected rows per bank, largest total first
fn totals_per_bank(rows: Vec<CollectedByBank>) -> Vec<BankTotalRow> {
    let mut per_bank: HashMap<Option<i64>, (Option<String>, Decimal, i64)> = HashMap::new();
    for row in rows {
        let entry = per_bank
            .entry(row.bank_id)
            .or_insert_with(|| (row.bank_name.clone(), Decimal::ZERO, 0));
        entry.1 += to_decimal(row.amount);
        entry.2 += 1;
    }

    let mut totals: Vec<(Decimal, BankTotalRow)> = per_bank
        .into_iter()
        .map(|(bank_id, (bank_name, total, count))| {
            (
                total,
                BankTotalRow {
                    bank_id,
                    bank_name,
                    total_amount: to_f64(total),
                    payment_count: count,
                },
            )
        })
        .collect();
    totals.sort_by(|(a, ra), (b, rb)| b.cmp(a).then(ra.bank_id.cmp(&rb.bank_id)));
    totals.into_iter().map(|(_, row)| row).collect()
}

/// Collected contributions for the `months` months ending at `now`
///
/// Months without payments appear with zero, oldest first.
pub async fn trend(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    now: YearMonth,
    months: u32,
) -> Result<Vec<TrendPoint>, AppError> {
    ensure_admin(ctx, "view analytics")?;
    if months == 0 || months > MAX_TREND_MONTHS {
        return Err(AppError::field(
            "months",
            format!("months must be between 1 and {MAX_TREND_MONTHS}"),
        ));
    }

    let window = trailing_months(now, months);
    let from = window.first().copied().unwrap_or(now);
    let mut totals: HashMap<YearMonth, Vec<f64>> = HashMap::new();
    for (month, amount) in payment::collected_in_months(pool, from, now).await? {
        totals.entry(month).or_default().push(amount);
    }

    Ok(window
        .into_iter()
        .map(|month| TrendPoint {
            month,
            collected: totals.remove(&month).map(sum_money).unwrap_or(0.0),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;
    use shared::ErrorCode;

    #[tokio::test]
    async fn test_overview_figures() {
        let pool = pool().await;
        let a = add_member(&pool, "A", "AN-1").await;
        let b = add_member(&pool, "B", "AN-2").await;
        let running = add_group(&pool, 100.0, "2024-01", "2024-12").await;
        let finished = add_group(&pool, 50.0, "2023-01", "2023-06").await;
        insert_slot(&pool, running, a.id, "2024-05").await;
        insert_slot(&pool, running, b.id, "2024-02").await;
        insert_slot(&pool, finished, b.id, "2023-03").await;

        add_payment(&pool, a.id, running, "2024-03", 100.0, PaymentStatus::Received).await;
        add_payment(&pool, b.id, running, "2024-03", 100.0, PaymentStatus::Pending).await;
        add_payment(&pool, b.id, running, "2024-02", 100.0, PaymentStatus::Settled).await;

        let o = overview(&pool, &admin(), ym("2024-03")).await.unwrap();
        assert_eq!(o.total_members, 2);
        assert_eq!(o.active_members, 1);
        assert_eq!(o.total_groups, 2);
        assert_eq!(o.active_groups, 1);
        assert_eq!(o.expected_this_month, 200.0);
        assert_eq!(o.collected_this_month, 100.0);
        assert_eq!(o.pending_payments, 1);
        assert_eq!(o.outstanding_this_month, 100.0);
    }

    #[tokio::test]
    async fn test_trend_fills_missing_months() {
        let pool = pool().await;
        let a = add_member(&pool, "A", "AN-3").await;
        let g = add_group(&pool, 75.5, "2023-10", "2024-12").await;
        add_payment(&pool, a.id, g, "2023-12", 75.5, PaymentStatus::Settled).await;
        add_payment(&pool, a.id, g, "2024-02", 75.5, PaymentStatus::Received).await;
        add_payment(&pool, a.id, g, "2024-02", 75.5, PaymentStatus::Received).await;
        add_payment(&pool, a.id, g, "2024-01", 75.5, PaymentStatus::Cancelled).await;

        let points = trend(&pool, &admin(), ym("2024-02"), 4).await.unwrap();
        let months: Vec<_> = points.iter().map(|p| p.month).collect();
        assert_eq!(months, vec![ym("2023-11"), ym("2023-12"), ym("2024-01"), ym("2024-02")]);
        let amounts: Vec<_> = points.iter().map(|p| p.collected).collect();
        assert_eq!(amounts, vec![0.0, 75.5, 0.0, 151.0]);

        let err = trend(&pool, &admin(), ym("2024-02"), 25).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_trend_and_bank_totals_match_overview() {
        let pool = pool().await;
        let a = add_member(&pool, "A", "AN-4").await;
        let g = add_group(&pool, 10.0, "2024-01", "2024-12").await;
        insert_slot(&pool, g, a.id, "2024-06").await;
        add_payment(&pool, a.id, g, "2024-02", 0.1, PaymentStatus::Received).await;
        add_payment(&pool, a.id, g, "2024-02", 0.2, PaymentStatus::Received).await;

        let o = overview(&pool, &admin(), ym("2024-02")).await.unwrap();
        assert_eq!(o.collected_this_month, 0.3);

        let points = trend(&pool, &admin(), ym("2024-02"), 1).await.unwrap();
        assert_eq!(points[0].collected, o.collected_this_month);

        let banks = bank_totals(&pool, &admin()).await.unwrap();
        assert_eq!(banks.by_receiver_bank.len(), 1);
        assert_eq!(banks.by_receiver_bank[0].bank_id, None);
        assert_eq!(banks.by_receiver_bank[0].total_amount, 0.3);
        assert_eq!(banks.by_receiver_bank[0].payment_count, 2);
    }

    #[tokio::test]
    async fn test_analytics_admin_only() {
        let pool = pool().await;
        let user = member_user(None);
        assert_eq!(
            overview(&pool, &user, ym("2024-01")).await.unwrap_err().code,
            ErrorCode::AdminRequired
        );
        assert_eq!(
            bank_totals(&pool, &user).await.unwrap_err().code,
            ErrorCode::AdminRequired
        );
        assert!(bank_totals(&pool, &admin()).await.unwrap().by_sender_bank.is_empty());
    }
}
