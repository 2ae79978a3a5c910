use std::fmt::Debug;

use log::*;
use tts_common::Money;

use crate::{
    db_types::{NewOrderRequest, NewProduct, Order, OrderStatus, PriceChangeRequest, Product},
    events::{EventProducers, OrderPaidEvent, OrderPlacedEvent, OrderShippedEvent, PaymentReleasedEvent},
    traits::{MarketplaceDatabase, MarketplaceError},
    tts_api::order_objects::OrderQueryFilter,
};

/// `OrderFlowApi` is the primary API for the order lifecycle: placement, pay-now retries for
/// on-hold orders, supplier fulfilment and the final payment release. It also carries the product
/// listing and price-change operations, since those feed directly into order costs.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Place a new order on behalf of a dropshipper.
    ///
    /// The buyer cost is derived from the supplier's listed price and the live commission setting.
    /// If the buyer's wallet can cover the cost, the debit and the move to `processing` happen
    /// atomically; otherwise the order is created `on-hold` with no money movement, and can be
    /// retried later with [`Self::pay_on_hold_order`].
    pub async fn place_order(&self, request: NewOrderRequest) -> Result<Order, MarketplaceError> {
        let order = self.db.place_order(request).await?;
        self.call_order_placed_hook(&order).await;
        if order.status == OrderStatus::Processing {
            self.call_order_paid_hook(&order).await;
        }
        debug!("🔄️🛒️ Order #{} placement complete with status '{}'", order.id, order.status);
        Ok(order)
    }

    /// Retry payment for an on-hold order. `elevated` callers (admins) may pay for orders they do
    /// not own; everyone else must be the order's buyer.
    pub async fn pay_on_hold_order(
        &self,
        order_id: i64,
        acting_user: i64,
        elevated: bool,
    ) -> Result<Order, MarketplaceError> {
        let order = self.db.pay_on_hold_order(order_id, acting_user, elevated).await?;
        self.call_order_paid_hook(&order).await;
        debug!("🔄️🛒️ Pay-now for order #{} complete", order.id);
        Ok(order)
    }

    /// Mark a processing order as shipped, optionally attaching a tracking number. Only the
    /// supplier who owns the product can do this.
    pub async fn fulfill_order(
        &self,
        order_id: i64,
        acting_supplier: i64,
        tracking_number: Option<String>,
    ) -> Result<Order, MarketplaceError> {
        let order = self.db.mark_order_shipped(order_id, acting_supplier, tracking_number).await?;
        self.call_order_shipped_hook(&order).await;
        Ok(order)
    }

    /// Complete a shipped order and credit the supplier their listed price. The difference between
    /// the buyer's debit and this credit is the platform's commission.
    pub async fn release_payment(&self, order_id: i64) -> Result<Order, MarketplaceError> {
        let order = self.db.release_order_payment(order_id).await?;
        let amount = match self.db.fetch_product(order.product_id).await? {
            Some(product) => product.price,
            None => Money::default(),
        };
        self.call_payment_released_hook(&order, amount).await;
        debug!("🔄️💰️ Payment of {amount} released for order #{}", order.id);
        Ok(order)
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, MarketplaceError> {
        self.db.create_product(product).await
    }

    /// A supplier asks for a new price on one of their products. The live price is untouched until
    /// an admin approves the request.
    pub async fn request_price_change(
        &self,
        product_id: i64,
        acting_supplier: i64,
        requested_price: Money,
    ) -> Result<PriceChangeRequest, MarketplaceError> {
        self.db.request_price_change(product_id, acting_supplier, requested_price).await
    }

    /// Approve or reject a pending price-change request. Approval updates the product's live
    /// price; existing order costs are never touched.
    pub async fn resolve_price_change(
        &self,
        request_id: i64,
        approve: bool,
    ) -> Result<PriceChangeRequest, MarketplaceError> {
        self.db.resolve_price_change(request_id, approve).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError> {
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError> {
        let order = self.db.fetch_order(order_id).await?;
        Ok(order)
    }

    pub async fn commission_bps(&self) -> Result<i64, MarketplaceError> {
        self.db.commission_bps().await
    }

    pub async fn set_commission_bps(&self, bps: i64) -> Result<(), MarketplaceError> {
        self.db.set_commission_bps(bps).await
    }

    async fn call_order_placed_hook(&self, order: &Order) {
        for emitter in &self.producers.order_placed_producer {
            trace!("🔄️🛒️ Notifying order placed hook subscribers");
            let event = OrderPlacedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            trace!("🔄️🛒️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_shipped_hook(&self, order: &Order) {
        for emitter in &self.producers.order_shipped_producer {
            trace!("🔄️🚚️ Notifying order shipped hook subscribers");
            let event = OrderShippedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_payment_released_hook(&self, order: &Order, amount: Money) {
        for emitter in &self.producers.payment_released_producer {
            trace!("🔄️💰️ Notifying payment released hook subscribers");
            let event = PaymentReleasedEvent::new(order.clone(), amount);
            emitter.publish_event(event).await;
        }
    }
}
