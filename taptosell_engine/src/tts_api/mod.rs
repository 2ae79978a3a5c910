//! # TapToSell engine public API
//!
//! The `tts_api` module exposes the programmatic API for the TapToSell marketplace engine.
//! The API is modular, so that clients can pick and choose the functionality they want, or run
//! different parts (e.g. auth and order flows) against different backends.
//!
//! * [`order_flow_api`] is the primary API for the order lifecycle: placement, pay-now retries,
//!   fulfilment and payment release, plus product listings and price-change requests.
//! * [`wallet_api`] provides methods for wallet balances, transaction histories, deposits and
//!   supplier withdrawals.
//! * [`auth_api`] resolves access tokens into user claims and manages user [`crate::db_types::Role`]s.
//!
//! The other submodules in this module are support and utility types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a
//! database backend that implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use taptosell_engine::{SqliteDatabase, WalletApi};
//! let db = SqliteDatabase::new_with_url("sqlite://data/tts.db", 5).await?;
//! // SqliteDatabase implements LedgerManagement and MarketplaceDatabase
//! let api = WalletApi::new(db, EventProducers::default());
//! let balance = api.balance(buyer_id).await?;
//! ```

pub mod auth_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod wallet_api;
