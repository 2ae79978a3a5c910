//! Wallet, deposit and withdrawal tests against a real SQLite database.
use taptosell_engine::{
    db_types::*,
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{LedgerManagement, MarketplaceError},
    SqliteDatabase,
    WalletApi,
};

async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

const SUPPLIER: i64 = 100;

#[tokio::test]
async fn withdrawal_reserves_the_full_amount_immediately() {
    let db = new_test_db().await;
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    wallet.deposit(SUPPLIER, Money::from_rm(50), "payout").await.unwrap();

    let withdrawal = wallet.request_withdrawal(SUPPLIER, Money::from_rm(50)).await.unwrap();
    assert_eq!(withdrawal.status, WithdrawalStatus::WdPending);
    assert_eq!(withdrawal.amount, Money::from_rm(50));
    assert_eq!(wallet.balance(SUPPLIER).await.unwrap(), Money::from_cents(0));

    let history = wallet.history(SUPPLIER).await.unwrap();
    assert!(history.iter().any(|e| e.entry_type == EntryType::WithdrawalRequest && e.amount == -Money::from_rm(50)));
}

#[tokio::test]
async fn withdrawal_over_the_balance_is_rejected_whole() {
    let db = new_test_db().await;
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    wallet.deposit(SUPPLIER, Money::from_rm(50), "payout").await.unwrap();

    // One sen over the line. No partial reservation is ever made.
    let err = wallet.request_withdrawal(SUPPLIER, Money::from_cents(5001)).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::InsufficientFunds(_)), "unexpected error: {err}");
    assert_eq!(wallet.balance(SUPPLIER).await.unwrap(), Money::from_rm(50));
    assert!(wallet.withdrawals_for_supplier(SUPPLIER).await.unwrap().is_empty());
}

#[tokio::test]
async fn withdrawal_amount_must_be_positive() {
    let db = new_test_db().await;
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    wallet.deposit(SUPPLIER, Money::from_rm(50), "payout").await.unwrap();

    for amount in [Money::from_cents(0), Money::from_rm(-5)] {
        let err = wallet.request_withdrawal(SUPPLIER, amount).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::AmountNotPositive(_)), "unexpected error: {err}");
    }
    assert_eq!(wallet.balance(SUPPLIER).await.unwrap(), Money::from_rm(50));
}

#[tokio::test]
async fn withdrawals_are_processed_exactly_once() {
    let db = new_test_db().await;
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    wallet.deposit(SUPPLIER, Money::from_rm(50), "payout").await.unwrap();
    let withdrawal = wallet.request_withdrawal(SUPPLIER, Money::from_rm(20)).await.unwrap();

    let processed = wallet.process_withdrawal(withdrawal.id).await.unwrap();
    assert_eq!(processed.status, WithdrawalStatus::WdProcessed);
    // Processing is a status flip only; the funds were reserved at request time.
    assert_eq!(wallet.balance(SUPPLIER).await.unwrap(), Money::from_rm(30));

    let err = wallet.process_withdrawal(withdrawal.id).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::WithdrawalAlreadyProcessed(_)), "unexpected error: {err}");

    let err = wallet.process_withdrawal(9999).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::WithdrawalNotFound(9999)), "unexpected error: {err}");
}

#[tokio::test]
async fn deposits_must_be_positive() {
    let db = new_test_db().await;
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    for amount in [Money::from_cents(0), Money::from_rm(-1)] {
        let err = wallet.deposit(SUPPLIER, amount, "bad").await.unwrap_err();
        assert!(matches!(err, MarketplaceError::AmountNotPositive(_)), "unexpected error: {err}");
    }
    assert!(wallet.history(SUPPLIER).await.unwrap().is_empty());
}

#[tokio::test]
async fn balance_is_always_the_sum_of_the_ledger() {
    let db = new_test_db().await;
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    wallet.deposit(SUPPLIER, Money::from_rm(80), "payout").await.unwrap();
    wallet.deposit(SUPPLIER, Money::from_cents(123), "payout").await.unwrap();
    wallet.request_withdrawal(SUPPLIER, Money::from_rm(30)).await.unwrap();

    let history = wallet.history(SUPPLIER).await.unwrap();
    let total: Money = history.iter().map(|e| e.amount).sum();
    assert_eq!(wallet.balance(SUPPLIER).await.unwrap(), total);
    assert_eq!(total, Money::from_cents(5123));
}

#[tokio::test]
async fn fresh_wallets_have_a_zero_balance() {
    let db = new_test_db().await;
    let wallet = WalletApi::new(db, EventProducers::default());
    assert_eq!(wallet.balance(4242).await.unwrap(), Money::from_cents(0));
    assert!(wallet.history(4242).await.unwrap().is_empty());
}
