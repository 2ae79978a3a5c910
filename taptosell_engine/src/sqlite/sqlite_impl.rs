//! `SqliteDatabase` is a concrete implementation of a TapToSell marketplace backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module. Every flow that moves money runs inside a single database
//! transaction, with the balance gate expressed as a conditional insert (see
//! [`super::db::ledger::conditional_debit`]).
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{auth, db_url, ledger, new_pool, orders, price_changes, products, settings, withdrawals};
use crate::{
    db_types::{
        EntryType,
        LedgerEntry,
        Money,
        NewLedgerEntry,
        NewOrder,
        NewOrderRequest,
        NewProduct,
        Order,
        OrderStatus,
        PriceChangeRequest,
        PriceChangeStatus,
        Product,
        Role,
        UserClaims,
        Withdrawal,
        WithdrawalStatus,
    },
    helpers::buyer_cost,
    traits::{
        AuthApiError,
        AuthManagement,
        LedgerApiError,
        LedgerManagement,
        MarketplaceDatabase,
        MarketplaceError,
    },
    tts_api::order_objects::OrderQueryFilter,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn place_order(&self, request: NewOrderRequest) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let product = products::fetch_product(request.product_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::ProductNotFound(request.product_id))?;
        if !product.price.is_positive() {
            // Nothing has been written yet; dropping the transaction rolls it back.
            return Err(MarketplaceError::PriceError(product.id));
        }
        let bps = settings::commission_bps(&mut tx).await?;
        let cost = buyer_cost(product.price, bps);
        if !cost.is_positive() {
            return Err(MarketplaceError::PriceError(product.id));
        }
        let order = orders::insert_order(NewOrder::new(product.id, request.buyer_id, cost), &mut tx).await?;
        let details = format!("Payment for order #{} (product '{}')", order.id, product.name);
        let debit = NewLedgerEntry::new(request.buyer_id, -cost, EntryType::OrderPayment).with_details(details);
        let order = match ledger::conditional_debit(debit, &mut tx).await? {
            Some(entry) => {
                let order = orders::update_order_status_guarded(order.id, OrderStatus::OnHold, OrderStatus::Processing, &mut tx)
                    .await?
                    .ok_or(MarketplaceError::OrderNotFound(order.id))?;
                products::decrement_stock(product.id, &mut tx).await?;
                debug!("🛒️ Order #{} placed as processing. Debit entry #{} of {}", order.id, entry.id, entry.amount);
                order
            },
            None => {
                debug!("🛒️ Order #{} placed on hold. Buyer #{} cannot cover {cost}", order.id, request.buyer_id);
                order
            },
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn pay_on_hold_order(
        &self,
        order_id: i64,
        acting_user: i64,
        elevated: bool,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if order.buyer_id != acting_user && !elevated {
            return Err(MarketplaceError::OrderOwnership(order_id));
        }
        if !order.status.can_transition_to(OrderStatus::Processing) {
            return Err(MarketplaceError::IllegalTransition { from: order.status, to: OrderStatus::Processing });
        }
        let product = products::fetch_product(order.product_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::ProductNotFound(order.product_id))?;
        let cost = order.cost;
        if !cost.is_positive() {
            // The stored cost stays authoritative even when it looks wrong; we only surface the
            // discrepancy.
            let bps = settings::commission_bps(&mut tx).await?;
            let recomputed = buyer_cost(product.price, bps);
            warn!(
                "🛒️ Order #{order_id} has a stored cost of {cost}. A fresh calculation gives {recomputed}. The \
                 stored cost remains authoritative; flag this order for review."
            );
        }
        let details = format!("Payment for order #{} (product '{}')", order.id, product.name);
        let debit = NewLedgerEntry::new(order.buyer_id, -cost, EntryType::OrderPayment).with_details(details);
        match ledger::conditional_debit(debit, &mut tx).await? {
            Some(_) => {
                let order = orders::update_order_status_guarded(order.id, OrderStatus::OnHold, OrderStatus::Processing, &mut tx)
                    .await?
                    .ok_or(MarketplaceError::OrderNotFound(order.id))?;
                products::decrement_stock(product.id, &mut tx).await?;
                tx.commit().await?;
                debug!("🛒️ Order #{} paid via pay-now and moved to processing", order.id);
                Ok(order)
            },
            // Dropping the transaction rolls back; the order remains on hold with no debit.
            None => Err(MarketplaceError::InsufficientFunds(cost)),
        }
    }

    async fn mark_order_shipped(
        &self,
        order_id: i64,
        acting_supplier: i64,
        tracking_number: Option<String>,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        let product = products::fetch_product(order.product_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::ProductNotFound(order.product_id))?;
        if product.supplier_id != acting_supplier {
            return Err(MarketplaceError::ProductOwnership(product.id));
        }
        if !order.status.can_transition_to(OrderStatus::Shipped) {
            return Err(MarketplaceError::IllegalTransition { from: order.status, to: OrderStatus::Shipped });
        }
        if let Some(tracking) = tracking_number.as_deref() {
            orders::set_tracking_number(order.id, tracking, &mut tx).await?;
        }
        let order = orders::update_order_status_guarded(order.id, OrderStatus::Processing, OrderStatus::Shipped, &mut tx)
            .await?
            .ok_or(MarketplaceError::IllegalTransition { from: order.status, to: OrderStatus::Shipped })?;
        tx.commit().await?;
        debug!("🚚️ Order #{} marked as shipped by supplier #{acting_supplier}", order.id);
        Ok(order)
    }

    async fn release_order_payment(&self, order_id: i64) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if !order.status.can_transition_to(OrderStatus::Completed) {
            return Err(MarketplaceError::IllegalTransition { from: order.status, to: OrderStatus::Completed });
        }
        let product = products::fetch_product(order.product_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::ProductNotFound(order.product_id))?;
        let order = orders::update_order_status_guarded(order.id, OrderStatus::Shipped, OrderStatus::Completed, &mut tx)
            .await?
            .ok_or(MarketplaceError::IllegalTransition { from: order.status, to: OrderStatus::Completed })?;
        // The supplier is credited their own listed price. The delta between the buyer's debit and
        // this credit is the platform commission, which simply stays unallocated in the ledger.
        let details = format!("Payment released for order #{}", order.id);
        let credit = NewLedgerEntry::new(product.supplier_id, product.price, EntryType::Payout).with_details(details);
        let entry = ledger::insert_entry(credit, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "💰️ Order #{} completed. Supplier #{} credited {} (entry #{})",
            order.id, product.supplier_id, product.price, entry.id
        );
        Ok(order)
    }

    async fn record_deposit(
        &self,
        user_id: i64,
        amount: Money,
        details: &str,
    ) -> Result<LedgerEntry, MarketplaceError> {
        if !amount.is_positive() {
            return Err(MarketplaceError::AmountNotPositive(amount));
        }
        let mut conn = self.pool.acquire().await?;
        let entry = NewLedgerEntry::new(user_id, amount, EntryType::Deposit).with_details(details);
        let entry = ledger::insert_entry(entry, &mut conn).await?;
        debug!("💰️ Deposit of {amount} recorded for user #{user_id}");
        Ok(entry)
    }

    async fn create_withdrawal(&self, supplier_id: i64, amount: Money) -> Result<Withdrawal, MarketplaceError> {
        if !amount.is_positive() {
            return Err(MarketplaceError::AmountNotPositive(amount));
        }
        let mut tx = self.pool.begin().await?;
        let withdrawal = withdrawals::insert_withdrawal(supplier_id, amount, &mut tx).await?;
        let details = format!("Withdrawal request #{}", withdrawal.id);
        let debit = NewLedgerEntry::new(supplier_id, -amount, EntryType::WithdrawalRequest).with_details(details);
        match ledger::conditional_debit(debit, &mut tx).await? {
            Some(_) => {
                tx.commit().await?;
                debug!("🏦️ Withdrawal #{} reserved {amount} from supplier #{supplier_id}", withdrawal.id);
                Ok(withdrawal)
            },
            // Roll back the withdrawal row too; a request that could not reserve funds never
            // existed.
            None => Err(MarketplaceError::InsufficientFunds(amount)),
        }
    }

    async fn process_withdrawal(&self, withdrawal_id: i64) -> Result<Withdrawal, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        match withdrawals::mark_processed_guarded(withdrawal_id, &mut conn).await? {
            Some(withdrawal) => {
                debug!("🏦️ Withdrawal #{} marked as processed", withdrawal.id);
                Ok(withdrawal)
            },
            None => match withdrawals::fetch_withdrawal(withdrawal_id, &mut conn).await? {
                Some(w) if w.status == WithdrawalStatus::WdProcessed => {
                    Err(MarketplaceError::WithdrawalAlreadyProcessed(withdrawal_id))
                },
                Some(_) | None => Err(MarketplaceError::WithdrawalNotFound(withdrawal_id)),
            },
        }
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn request_price_change(
        &self,
        product_id: i64,
        acting_supplier: i64,
        requested_price: Money,
    ) -> Result<PriceChangeRequest, MarketplaceError> {
        if !requested_price.is_positive() {
            return Err(MarketplaceError::AmountNotPositive(requested_price));
        }
        let mut tx = self.pool.begin().await?;
        let product = products::fetch_product(product_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::ProductNotFound(product_id))?;
        if product.supplier_id != acting_supplier {
            return Err(MarketplaceError::ProductOwnership(product_id));
        }
        let request = price_changes::insert_request(product_id, requested_price, &mut tx).await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn resolve_price_change(
        &self,
        request_id: i64,
        approve: bool,
    ) -> Result<PriceChangeRequest, MarketplaceError> {
        let resolution = if approve { PriceChangeStatus::PcrApproved } else { PriceChangeStatus::PcrRejected };
        let mut tx = self.pool.begin().await?;
        let request = match price_changes::resolve_guarded(request_id, resolution, &mut tx).await? {
            Some(request) => request,
            None => {
                return match price_changes::fetch_request(request_id, &mut tx).await? {
                    Some(_) => Err(MarketplaceError::PriceChangeAlreadyResolved(request_id)),
                    None => Err(MarketplaceError::PriceChangeNotFound(request_id)),
                };
            },
        };
        if approve {
            products::set_price(request.product_id, request.requested_price, &mut tx).await?;
            debug!("📦️ Price change #{request_id} approved. Product #{} now at {}", request.product_id, request.requested_price);
        }
        tx.commit().await?;
        Ok(request)
    }

    async fn commission_bps(&self) -> Result<i64, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        settings::commission_bps(&mut conn).await
    }

    async fn set_commission_bps(&self, bps: i64) -> Result<(), MarketplaceError> {
        if !(0..=10_000).contains(&bps) {
            return Err(MarketplaceError::InvalidCommission(bps));
        }
        let mut conn = self.pool.acquire().await?;
        settings::set_commission_bps(bps, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn balance_for_user(&self, user_id: i64) -> Result<Money, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        ledger::balance_for_user(user_id, &mut conn).await
    }

    async fn entries_for_user(&self, user_id: i64) -> Result<Vec<LedgerEntry>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        ledger::entries_for_user(user_id, &mut conn).await
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_withdrawal(&self, withdrawal_id: i64) -> Result<Option<Withdrawal>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawal = withdrawals::fetch_withdrawal(withdrawal_id, &mut conn).await?;
        Ok(withdrawal)
    }

    async fn withdrawals_for_supplier(&self, supplier_id: i64) -> Result<Vec<Withdrawal>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::withdrawals_for_supplier(supplier_id, &mut conn).await?;
        Ok(withdrawals)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn claims_for_token(&self, token: &str) -> Result<Option<UserClaims>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::claims_for_token(token, &mut conn).await
    }

    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::roles_for_user(user_id, &mut conn).await
    }

    async fn check_user_has_role(&self, user_id: i64, role: Role) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::user_has_role(user_id, role, &mut conn).await
    }

    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut tx = self.pool.begin().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::assign_roles(user_id, roles, &mut tx).await?;
        tx.commit().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::remove_roles(user_id, roles, &mut conn).await
    }

    async fn issue_token(&self, user_id: i64, token: &str) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::insert_token(user_id, token, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
