//! TapToSell Marketplace Engine
//!
//! The TapToSell engine is the core of a dropshipping marketplace: suppliers list products,
//! dropshippers order them with funds from an internal wallet, and the platform takes a commission
//! on every completed order. This library contains the core logic and is server-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly. Instead, use the public API provided by
//!    the engine. The exception is the data types used in the database, defined in the
//!    [`mod@db_types`] module, which are public.
//! 2. The engine public API ([`mod@tts_api`]). This provides the public-facing functionality:
//!    order flows, wallets and withdrawals, and authentication. Backends implement the traits in
//!    [`mod@traits`] in order to drive these APIs.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted
//! when certain actions occur, for example when an order is paid or a withdrawal is requested. A
//! simple actor framework lets you hook into these events and perform custom actions.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;
mod tts_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use tts_api::{
    auth_api::AuthApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    wallet_api::WalletApi,
};
