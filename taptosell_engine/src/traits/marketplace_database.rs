use thiserror::Error;

use crate::{
    db_types::{
        LedgerEntry,
        Money,
        NewOrderRequest,
        NewProduct,
        Order,
        OrderStatus,
        PriceChangeRequest,
        Product,
        Withdrawal,
    },
    traits::{LedgerApiError, LedgerManagement},
};

/// The highest level of behaviour for backends supporting the TapToSell marketplace engine.
///
/// Every method that moves money is required to run in a single database transaction, with the
/// balance gate expressed as an atomic conditional insert so that two racing requests can never
/// both debit against the same balance.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + LedgerManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Place a new order for the buyer named in the request.
    ///
    /// The buyer cost is `supplier price × (1 + commission)`, with the commission read fresh from
    /// the settings store. If the product has no usable price, the placement fails before anything
    /// is written.
    ///
    /// In one transaction: the order is created, and a conditional debit for the cost is attempted
    /// against the buyer's wallet. If the debit lands, the order is `processing` and stock is
    /// decremented by one for non-variable products; otherwise the order is returned `on-hold`
    /// with no ledger or stock effect.
    async fn place_order(&self, request: NewOrderRequest) -> Result<Order, MarketplaceError>;

    /// Retry the balance-check-and-debit sequence for an `on-hold` order.
    ///
    /// The order's buyer must equal `acting_user` unless `elevated` is set. The **stored** order
    /// cost is authoritative; a non-positive stored cost is logged but never recomputed on the
    /// fly. On success the order transitions to `processing` with exactly one debit; on
    /// insufficient balance nothing is written and the order stays `on-hold`.
    async fn pay_on_hold_order(
        &self,
        order_id: i64,
        acting_user: i64,
        elevated: bool,
    ) -> Result<Order, MarketplaceError>;

    /// Supplier fulfilment: transition `processing → shipped`, persisting the tracking number if
    /// one is provided. The product's supplier must equal `acting_supplier`. No ledger effect.
    async fn mark_order_shipped(
        &self,
        order_id: i64,
        acting_supplier: i64,
        tracking_number: Option<String>,
    ) -> Result<Order, MarketplaceError>;

    /// Admin payment release: transition `shipped → completed` and credit the supplier's wallet
    /// with the product's **listed price** (not the buyer cost; the commission delta is retained
    /// by the platform), atomically. The shipped precondition is enforced here, not by any UI.
    async fn release_order_payment(&self, order_id: i64) -> Result<Order, MarketplaceError>;

    /// Record an external top-up as a `deposit` credit. The amount must be positive.
    async fn record_deposit(&self, user_id: i64, amount: Money, details: &str)
        -> Result<LedgerEntry, MarketplaceError>;

    /// Create a withdrawal request for the supplier. The amount must be positive and covered by
    /// the current balance; the full amount is debited (`withdrawal-request`) in the same
    /// transaction that creates the `wd-pending` row, so the funds are gone from the balance the
    /// moment the request exists.
    async fn create_withdrawal(&self, supplier_id: i64, amount: Money) -> Result<Withdrawal, MarketplaceError>;

    /// Flip a withdrawal from `wd-pending` to `wd-processed`. This never writes to the ledger;
    /// the money was already reserved when the request was filed. Reprocessing fails.
    async fn process_withdrawal(&self, withdrawal_id: i64) -> Result<Withdrawal, MarketplaceError>;

    async fn create_product(&self, product: NewProduct) -> Result<Product, MarketplaceError>;

    /// File a price-change request for a product owned by `acting_supplier`. Pending requests have
    /// no effect on order costing.
    async fn request_price_change(
        &self,
        product_id: i64,
        acting_supplier: i64,
        requested_price: Money,
    ) -> Result<PriceChangeRequest, MarketplaceError>;

    /// Approve (applying the new price to the product) or reject a pending price-change request.
    async fn resolve_price_change(&self, request_id: i64, approve: bool)
        -> Result<PriceChangeRequest, MarketplaceError>;

    /// The platform commission in basis points, read fresh from the settings store on every call.
    async fn commission_bps(&self) -> Result<i64, MarketplaceError>;

    async fn set_commission_bps(&self, bps: i64) -> Result<(), MarketplaceError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MarketplaceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {0} has no usable price")]
    PriceError(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {0} does not belong to the acting user")]
    OrderOwnership(i64),
    #[error("Product {0} does not belong to the acting supplier")]
    ProductOwnership(i64),
    #[error("Illegal order transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("Insufficient funds to cover {0}")]
    InsufficientFunds(Money),
    #[error("Amount must be positive, got {0}")]
    AmountNotPositive(Money),
    #[error("The requested withdrawal {0} does not exist")]
    WithdrawalNotFound(i64),
    #[error("Withdrawal {0} has already been processed")]
    WithdrawalAlreadyProcessed(i64),
    #[error("The requested price change {0} does not exist")]
    PriceChangeNotFound(i64),
    #[error("Price change {0} has already been resolved")]
    PriceChangeAlreadyResolved(i64),
    #[error("Invalid commission: {0} basis points")]
    InvalidCommission(i64),
    #[error("{0}")]
    LedgerError(#[from] LedgerApiError),
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}
