use serde::{Deserialize, Serialize};
use tts_common::Money;

use crate::db_types::{Order, Withdrawal};

/// Fired whenever a new order is created, whether it could be paid immediately or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order: Order,
}

impl OrderPlacedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when an order's wallet debit succeeds and the order moves to `processing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShippedEvent {
    pub order: Order,
}

impl OrderShippedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when an admin completes an order and the supplier payout lands in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReleasedEvent {
    pub order: Order,
    pub amount: Money,
}

impl PaymentReleasedEvent {
    pub fn new(order: Order, amount: Money) -> Self {
        Self { order, amount }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequestedEvent {
    pub withdrawal: Withdrawal,
}

impl WithdrawalRequestedEvent {
    pub fn new(withdrawal: Withdrawal) -> Self {
        Self { withdrawal }
    }
}