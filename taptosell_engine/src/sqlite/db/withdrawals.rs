use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Money, Withdrawal},
    traits::MarketplaceError,
};

pub async fn insert_withdrawal(
    supplier_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, MarketplaceError> {
    let withdrawal: Withdrawal = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (supplier_id, amount)
            VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(supplier_id)
    .bind(amount)
    .fetch_one(conn)
    .await?;
    debug!("🏦️ Withdrawal #{} of {} filed by supplier #{}", withdrawal.id, amount, supplier_id);
    Ok(withdrawal)
}

pub async fn fetch_withdrawal(id: i64, conn: &mut SqliteConnection) -> Result<Option<Withdrawal>, sqlx::Error> {
    let withdrawal = sqlx::query_as("SELECT * FROM withdrawals WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(withdrawal)
}

/// Flips `wd-pending` to `wd-processed` in a single guarded UPDATE. Returns `None` if the
/// withdrawal is missing or was already processed; the caller disambiguates.
pub async fn mark_processed_guarded(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Withdrawal>, MarketplaceError> {
    let result: Option<Withdrawal> = sqlx::query_as(
        r#"
            UPDATE withdrawals SET status = 'wd-processed', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'wd-pending'
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

pub async fn withdrawals_for_supplier(
    supplier_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE supplier_id = $1 ORDER BY id ASC")
        .bind(supplier_id)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}
