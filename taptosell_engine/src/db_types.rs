use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use tts_common::Money;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------     EntryType       ---------------------------------------------------------
/// The closed set of ledger entry types. The wire/database representation is kebab-case, e.g.
/// `order-payment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    /// Funds credited to a wallet from outside the marketplace.
    Deposit,
    /// A debit covering the buyer cost of an order.
    OrderPayment,
    /// A credit to a supplier when an order completes.
    Payout,
    /// A debit reserving funds for a pending withdrawal.
    WithdrawalRequest,
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Deposit => write!(f, "deposit"),
            EntryType::OrderPayment => write!(f, "order-payment"),
            EntryType::Payout => write!(f, "payout"),
            EntryType::WithdrawalRequest => write!(f, "withdrawal-request"),
        }
    }
}

impl FromStr for EntryType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "order-payment" => Ok(Self::OrderPayment),
            "payout" => Ok(Self::Payout),
            "withdrawal-request" => Ok(Self::WithdrawalRequest),
            s => Err(ConversionError(format!("Invalid ledger entry type: {s}"))),
        }
    }
}

//--------------------------------------    LedgerEntry      ---------------------------------------------------------
/// An immutable signed monetary entry attributed to one user. The schema forbids updates and
/// deletes; a user's balance is always the sum of their entries.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub amount: Money,
    pub entry_type: EntryType,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: i64,
    pub amount: Money,
    pub entry_type: EntryType,
    pub details: String,
}

impl NewLedgerEntry {
    pub fn new(user_id: i64, amount: Money, entry_type: EntryType) -> Self {
        Self { user_id, amount, entry_type, details: String::new() }
    }

    pub fn with_details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = details.into();
        self
    }
}

//--------------------------------------    OrderStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// The order was created without a successful debit and is awaiting a pay-now retry.
    OnHold,
    /// The buyer's wallet has been debited and the supplier can fulfil the order.
    Processing,
    /// The supplier has shipped the order. Money has not moved yet.
    Shipped,
    /// Payment has been released to the supplier. Terminal.
    Completed,
}

impl OrderStatus {
    /// The complete transition table for orders. Every status change in the system funnels through
    /// this check; there is no other way to move an order between states.
    ///
    /// | From \ To  | on-hold | processing | shipped | completed |
    /// |------------|---------|------------|---------|-----------|
    /// | on-hold    | -       | ok         | -       | -         |
    /// | processing | -       | -          | ok      | -         |
    /// | shipped    | -       | -          | -       | ok        |
    /// | completed  | -       | -          | -       | -         |
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!((self, next), (OnHold, Processing) | (Processing, Shipped) | (Shipped, Completed))
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Completed
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::OnHold => write!(f, "on-hold"),
            OrderStatus::Processing => write!(f, "processing"),
            OrderStatus::Shipped => write!(f, "shipped"),
            OrderStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on-hold" => Ok(Self::OnHold),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to on-hold");
            OrderStatus::OnHold
        })
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub product_id: i64,
    /// The dropshipper who placed the order.
    pub buyer_id: i64,
    /// The buyer cost, fixed at creation. Supplier price plus platform commission.
    pub cost: Money,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: i64,
    pub buyer_id: i64,
    /// The buyer cost as computed at placement time. Immutable thereafter.
    pub cost: Money,
}

impl NewOrder {
    pub fn new(product_id: i64, buyer_id: i64, cost: Money) -> Self {
        Self { product_id, buyer_id, cost }
    }
}

/// The input to the order placement flow. The cost is not part of the request; it is always derived
/// from the supplier price and the live commission setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub product_id: i64,
    pub buyer_id: i64,
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: i64,
    /// The supplier who listed the product and receives the payout on completion.
    pub supplier_id: i64,
    pub name: String,
    /// The supplier's listed price. The buyer cost is this plus commission.
    pub price: Money,
    pub stock: i64,
    /// Variable (multi-SKU) products do not have a meaningful single stock count and are never
    /// decremented by the order flows.
    pub is_variable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub supplier_id: i64,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub is_variable: bool,
}

//--------------------------------------  WithdrawalStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum WithdrawalStatus {
    WdPending,
    WdProcessed,
}

impl Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WithdrawalStatus::WdPending => write!(f, "wd-pending"),
            WithdrawalStatus::WdProcessed => write!(f, "wd-processed"),
        }
    }
}

impl FromStr for WithdrawalStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wd-pending" => Ok(Self::WdPending),
            "wd-processed" => Ok(Self::WdProcessed),
            s => Err(ConversionError(format!("Invalid withdrawal status: {s}"))),
        }
    }
}

//--------------------------------------     Withdrawal      ---------------------------------------------------------
/// A supplier's request to take funds out of their wallet. The funds are reserved (debited) at
/// request time, so processing the request never touches the ledger again.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub supplier_id: i64,
    pub amount: Money,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//------------------------------------  PriceChangeStatus  -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PriceChangeStatus {
    PcrPending,
    PcrApproved,
    PcrRejected,
}

impl Display for PriceChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceChangeStatus::PcrPending => write!(f, "pcr-pending"),
            PriceChangeStatus::PcrApproved => write!(f, "pcr-approved"),
            PriceChangeStatus::PcrRejected => write!(f, "pcr-rejected"),
        }
    }
}

//------------------------------------  PriceChangeRequest  ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceChangeRequest {
    pub id: i64,
    pub product_id: i64,
    pub requested_price: Money,
    pub status: PriceChangeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Lists products and fulfils orders. Paid out when orders complete.
    Supplier,
    /// Places and pays for orders.
    Dropshipper,
    /// Operational admin. Releases payments, processes withdrawals, manages settings.
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Supplier => write!(f, "supplier"),
            Role::Dropshipper => write!(f, "dropshipper"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supplier" => Ok(Self::Supplier),
            "dropshipper" => Ok(Self::Dropshipper),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------     UserClaims      ---------------------------------------------------------
/// The authenticated identity attached to a request: the host-framework user id and the roles
/// granted to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub user_id: i64,
    pub roles: Vec<Role>,
}

impl UserClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_status_round_trip() {
        for s in ["on-hold", "processing", "shipped", "completed"] {
            let status: OrderStatus = s.parse().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn transition_table_is_a_straight_line() {
        use OrderStatus::*;
        let all = [OnHold, Processing, Shipped, Completed];
        for from in all {
            for to in all {
                let legal = matches!((from, to), (OnHold, Processing) | (Processing, Shipped) | (Shipped, Completed));
                assert_eq!(from.can_transition_to(to), legal, "{from} -> {to}");
            }
        }
        assert!(Completed.is_terminal());
        assert!(!Shipped.is_terminal());
    }

    #[test]
    fn entry_type_wire_format() {
        assert_eq!(EntryType::WithdrawalRequest.to_string(), "withdrawal-request");
        assert_eq!("order-payment".parse::<EntryType>().unwrap(), EntryType::OrderPayment);
    }

    #[test]
    fn claims_role_checks() {
        let claims = UserClaims { user_id: 7, roles: vec![Role::Supplier, Role::Admin] };
        assert!(claims.has_role(Role::Supplier));
        assert!(claims.is_admin());
        assert!(!claims.has_role(Role::Dropshipper));
    }
}
