use thiserror::Error;

use crate::{
    db_types::{LedgerEntry, Money, Order, Product, Withdrawal},
    tts_api::order_objects::OrderQueryFilter,
};

/// Read-only queries over wallets, orders, products and withdrawals.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement: Clone {
    /// The current balance for the user: the sum over all their ledger entries, or zero if there
    /// are none. There is no cached running balance and no negative-result normalization.
    async fn balance_for_user(&self, user_id: i64) -> Result<Money, LedgerApiError>;

    /// All ledger entries for the user, oldest first.
    async fn entries_for_user(&self, user_id: i64) -> Result<Vec<LedgerEntry>, LedgerApiError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerApiError>;

    /// Fetches orders matching the given filter, ordered by creation time ascending.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerApiError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, LedgerApiError>;

    async fn fetch_withdrawal(&self, withdrawal_id: i64) -> Result<Option<Withdrawal>, LedgerApiError>;

    async fn withdrawals_for_supplier(&self, supplier_id: i64) -> Result<Vec<Withdrawal>, LedgerApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for LedgerApiError {
    fn from(e: sqlx::Error) -> Self {
        LedgerApiError::DatabaseError(e.to_string())
    }
}
