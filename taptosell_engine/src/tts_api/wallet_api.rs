use std::fmt::Debug;

use log::*;
use tts_common::Money;

use crate::{
    db_types::{LedgerEntry, Withdrawal},
    events::{EventProducers, WithdrawalRequestedEvent},
    traits::{LedgerApiError, MarketplaceDatabase, MarketplaceError},
};

/// The `WalletApi` provides a unified API for wallet balances, transaction histories, deposits and
/// supplier withdrawals.
pub struct WalletApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for WalletApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi ({:?})", self.db)
    }
}

impl<B> WalletApi<B>
where B: MarketplaceDatabase
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// The user's balance: the sum of every ledger entry attributed to them. An empty ledger is a
    /// zero balance, not an error.
    pub async fn balance(&self, user_id: i64) -> Result<Money, LedgerApiError> {
        self.db.balance_for_user(user_id).await
    }

    /// The user's full transaction history, newest first.
    pub async fn history(&self, user_id: i64) -> Result<Vec<LedgerEntry>, LedgerApiError> {
        self.db.entries_for_user(user_id).await
    }

    /// Credit a user's wallet from an external payment. Admin only; the amount must be positive.
    pub async fn deposit(&self, user_id: i64, amount: Money, details: &str) -> Result<LedgerEntry, MarketplaceError> {
        self.db.record_deposit(user_id, amount, details).await
    }

    /// A supplier asks to take funds out. The amount is reserved (debited) immediately, so the
    /// request fails up front if the balance cannot cover it.
    pub async fn request_withdrawal(&self, supplier_id: i64, amount: Money) -> Result<Withdrawal, MarketplaceError> {
        let withdrawal = self.db.create_withdrawal(supplier_id, amount).await?;
        self.call_withdrawal_requested_hook(&withdrawal).await;
        debug!("🔄️🏦️ Withdrawal #{} of {amount} requested by supplier #{supplier_id}", withdrawal.id);
        Ok(withdrawal)
    }

    /// Mark a pending withdrawal as processed. The funds were already reserved at request time, so
    /// this never touches the ledger.
    pub async fn process_withdrawal(&self, withdrawal_id: i64) -> Result<Withdrawal, MarketplaceError> {
        self.db.process_withdrawal(withdrawal_id).await
    }

    pub async fn withdrawals_for_supplier(&self, supplier_id: i64) -> Result<Vec<Withdrawal>, LedgerApiError> {
        self.db.withdrawals_for_supplier(supplier_id).await
    }

    async fn call_withdrawal_requested_hook(&self, withdrawal: &Withdrawal) {
        for emitter in &self.producers.withdrawal_requested_producer {
            trace!("🔄️🏦️ Notifying withdrawal requested hook subscribers");
            let event = WithdrawalRequestedEvent::new(withdrawal.clone());
            emitter.publish_event(event).await;
        }
    }
}
