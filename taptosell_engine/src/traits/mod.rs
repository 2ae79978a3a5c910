//! # Backend interface contracts
//!
//! This module defines the traits a storage backend must implement to drive the TapToSell
//! marketplace engine.
//!
//! ## Wallets and the ledger
//! A wallet is nothing more than the set of ledger entries for a user; the balance is the sum of
//! those entries, recomputed on every read. The [`MarketplaceDatabase`] trait owns every operation
//! that writes to the ledger, and each of those operations is required to be atomic: the balance
//! check and the debit happen in a single guarded statement so racing requests cannot both pass the
//! gate.
//!
//! ## Traits
//! * [`MarketplaceDatabase`]: the order, payment, withdrawal and settings flows (all writes).
//! * [`LedgerManagement`]: read-only queries over wallets, orders, products and withdrawals.
//! * [`AuthManagement`]: roles and bearer tokens.
mod auth_management;
mod ledger_management;
mod marketplace_database;

pub use auth_management::{AuthApiError, AuthManagement};
pub use ledger_management::{LedgerApiError, LedgerManagement};
pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
