use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{LedgerEntry, Money, NewLedgerEntry},
    traits::LedgerApiError,
};

/// The user's balance: the sum over all their ledger entries, zero when there are none. Computed
/// by aggregation on every call; nothing is cached.
pub async fn balance_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Money, LedgerApiError> {
    let (balance,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(amount), 0) FROM ledger_entries WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
    Ok(Money::from(balance))
}

pub async fn entries_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<LedgerEntry>, LedgerApiError> {
    let entries = sqlx::query_as("SELECT * FROM ledger_entries WHERE user_id = $1 ORDER BY id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}

/// Writes an unconditional ledger entry (deposits and payouts). Debits against a balance gate must
/// go through [`conditional_debit`] instead.
pub async fn insert_entry(entry: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<LedgerEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO ledger_entries (user_id, amount, entry_type, details)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.amount)
    .bind(entry.entry_type)
    .bind(entry.details)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// Attempts a debit that may not push the user's balance below zero.
///
/// The balance check and the insert are one statement, so the gate holds even when two requests
/// race: whichever lands second re-evaluates the sum including the first debit. `amount` must be
/// negative; the insert only happens when `SUM(amount) + amount >= 0`.
///
/// Returns the new entry, or `None` when the balance could not cover the debit (in which case
/// nothing was written).
pub async fn conditional_debit(
    entry: NewLedgerEntry,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerEntry>, LedgerApiError> {
    if entry.amount.value() >= 0 {
        return Err(LedgerApiError::QueryError(format!(
            "conditional_debit requires a negative amount, got {}",
            entry.amount
        )));
    }
    let result: Option<LedgerEntry> = sqlx::query_as(
        r#"
            INSERT INTO ledger_entries (user_id, amount, entry_type, details)
            SELECT $1, $2, $3, $4
            WHERE (SELECT COALESCE(SUM(amount), 0) FROM ledger_entries WHERE user_id = $1) + $2 >= 0
            RETURNING *;
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.amount)
    .bind(entry.entry_type)
    .bind(entry.details)
    .fetch_optional(conn)
    .await?;
    if result.is_none() {
        trace!("💳️ Debit of {} for user #{} refused: balance too low", -entry.amount, entry.user_id);
    }
    Ok(result)
}
