//! End-to-end order lifecycle tests against a real SQLite database.
use log::*;
use taptosell_engine::{
    db_types::*,
    events::EventProducers,
    order_objects::OrderQueryFilter,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{LedgerManagement, MarketplaceDatabase, MarketplaceError},
    OrderFlowApi,
    SqliteDatabase,
    WalletApi,
};

async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

fn widget(supplier_id: i64, price: Money) -> NewProduct {
    NewProduct { supplier_id, name: "Widget".to_string(), price, stock: 5, is_variable: false }
}

const SUPPLIER: i64 = 100;
const BUYER: i64 = 200;
const ADMIN: i64 = 999;

#[tokio::test]
async fn order_with_sufficient_funds_is_debited_and_processing() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(20), "top up").await.unwrap();

    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    // RM10 plus the default 5% commission
    assert_eq!(order.cost, Money::from_cents(1050));
    assert_eq!(wallet.balance(BUYER).await.unwrap(), Money::from_cents(950));
    let product = db.fetch_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 4);

    let history = wallet.history(BUYER).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|e| e.entry_type == EntryType::OrderPayment && e.amount == -Money::from_cents(1050)));
}

#[tokio::test]
async fn order_without_funds_goes_on_hold_with_no_side_effects() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(5), "top up").await.unwrap();

    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    assert_eq!(order.status, OrderStatus::OnHold);
    assert_eq!(wallet.balance(BUYER).await.unwrap(), Money::from_rm(5));
    let product = db.fetch_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 5);
    // No order-payment entry was written
    let history = wallet.history(BUYER).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn unpriced_product_cannot_be_ordered() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_cents(0))).await.unwrap();

    let err = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::PriceError(_)), "unexpected error: {err}");
    let filter = OrderQueryFilter::default().with_buyer_id(BUYER);
    assert!(db.search_orders(filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn ordering_a_missing_product_fails() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let err = orders.place_order(NewOrderRequest { product_id: 9999, buyer_id: BUYER }).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ProductNotFound(9999)), "unexpected error: {err}");
}

#[tokio::test]
async fn pay_now_succeeds_once_the_wallet_is_topped_up() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    assert_eq!(order.status, OrderStatus::OnHold);

    // Still broke. The retry must not move the order or the money.
    let err = orders.pay_on_hold_order(order.id, BUYER, false).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::InsufficientFunds(_)), "unexpected error: {err}");
    assert_eq!(db.fetch_order(order.id).await.unwrap().unwrap().status, OrderStatus::OnHold);
    assert_eq!(wallet.balance(BUYER).await.unwrap(), Money::from_cents(0));

    wallet.deposit(BUYER, Money::from_rm(20), "top up").await.unwrap();
    let order = orders.pay_on_hold_order(order.id, BUYER, false).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(wallet.balance(BUYER).await.unwrap(), Money::from_cents(950));
    let product = db.fetch_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 4);
}

#[tokio::test]
async fn pay_now_is_owner_or_admin_only() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(20), "top up").await.unwrap();

    let err = orders.pay_on_hold_order(order.id, 201, false).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::OrderOwnership(_)), "unexpected error: {err}");

    // An elevated caller can pay on the buyer's behalf; the debit still hits the buyer's wallet.
    let order = orders.pay_on_hold_order(order.id, ADMIN, true).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(wallet.balance(BUYER).await.unwrap(), Money::from_cents(950));
}

#[tokio::test]
async fn pay_now_rejects_orders_that_are_not_on_hold() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(20), "top up").await.unwrap();
    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);

    let err = orders.pay_on_hold_order(order.id, BUYER, false).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::IllegalTransition { .. }), "unexpected error: {err}");
    // Exactly one debit on the books
    let history = wallet.history(BUYER).await.unwrap();
    assert_eq!(history.iter().filter(|e| e.entry_type == EntryType::OrderPayment).count(), 1);
}

#[tokio::test]
async fn only_the_product_owner_can_ship() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(20), "top up").await.unwrap();
    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();

    let err = orders.fulfill_order(order.id, 101, Some("TRK-1".into())).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ProductOwnership(_)), "unexpected error: {err}");

    let order = orders.fulfill_order(order.id, SUPPLIER, Some("TRK-1".into())).await.unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(order.tracking_number.as_deref(), Some("TRK-1"));
}

#[tokio::test]
async fn on_hold_orders_cannot_be_shipped() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    assert_eq!(order.status, OrderStatus::OnHold);

    let err = orders.fulfill_order(order.id, SUPPLIER, None).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::IllegalTransition { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn release_pays_the_supplier_their_listed_price() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(20), "top up").await.unwrap();
    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();

    // Cannot release before shipping
    let err = orders.release_payment(order.id).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::IllegalTransition { .. }), "unexpected error: {err}");

    orders.fulfill_order(order.id, SUPPLIER, None).await.unwrap();
    let order = orders.release_payment(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    // The supplier gets RM10; the 50 sen commission stays with the platform.
    assert_eq!(wallet.balance(SUPPLIER).await.unwrap(), Money::from_rm(10));
    assert_eq!(wallet.balance(BUYER).await.unwrap(), Money::from_cents(950));

    // Completed is terminal; a second release must not double-pay.
    let err = orders.release_payment(order.id).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::IllegalTransition { .. }), "unexpected error: {err}");
    assert_eq!(wallet.balance(SUPPLIER).await.unwrap(), Money::from_rm(10));
}

#[tokio::test]
async fn variable_products_never_decrement_stock() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let mut listing = widget(SUPPLIER, Money::from_rm(10));
    listing.is_variable = true;
    let product = orders.create_product(listing).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(20), "top up").await.unwrap();

    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    let product = db.fetch_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 5);
}

#[tokio::test]
async fn double_submit_debits_at_most_once() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    // Enough for one RM10.50 order but not two
    wallet.deposit(BUYER, Money::from_rm(15), "top up").await.unwrap();

    let first = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    let second = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    info!("First order: {}. Second order: {}", first.status, second.status);
    assert_eq!(first.status, OrderStatus::Processing);
    assert_eq!(second.status, OrderStatus::OnHold);
    assert_eq!(wallet.balance(BUYER).await.unwrap(), Money::from_cents(450));
}

#[tokio::test]
async fn commission_changes_only_affect_new_orders() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(50), "top up").await.unwrap();

    let first = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    assert_eq!(first.cost, Money::from_cents(1050));

    orders.set_commission_bps(1000).await.unwrap();
    let second = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    assert_eq!(second.cost, Money::from_rm(11));
    // The earlier order's cost is frozen
    assert_eq!(db.fetch_order(first.id).await.unwrap().unwrap().cost, Money::from_cents(1050));

    let err = orders.set_commission_bps(-1).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::InvalidCommission(-1)), "unexpected error: {err}");
}

#[tokio::test]
async fn price_changes_apply_on_approval_only() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(50), "top up").await.unwrap();
    let order = orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();

    // Only the owner can ask for a new price
    let err = orders.request_price_change(product.id, 101, Money::from_rm(12)).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ProductOwnership(_)), "unexpected error: {err}");

    let request = orders.request_price_change(product.id, SUPPLIER, Money::from_rm(12)).await.unwrap();
    assert_eq!(request.status, PriceChangeStatus::PcrPending);
    // Pending requests do not touch the live price
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().price, Money::from_rm(10));

    let request = orders.resolve_price_change(request.id, true).await.unwrap();
    assert_eq!(request.status, PriceChangeStatus::PcrApproved);
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().price, Money::from_rm(12));
    // Costs of existing orders are never restated
    assert_eq!(db.fetch_order(order.id).await.unwrap().unwrap().cost, Money::from_cents(1050));

    let err = orders.resolve_price_change(request.id, false).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::PriceChangeAlreadyResolved(_)), "unexpected error: {err}");

    // A rejection leaves the price alone
    let request = orders.request_price_change(product.id, SUPPLIER, Money::from_rm(99)).await.unwrap();
    let request = orders.resolve_price_change(request.id, false).await.unwrap();
    assert_eq!(request.status, PriceChangeStatus::PcrRejected);
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().price, Money::from_rm(12));
}

#[tokio::test]
async fn order_search_filters_by_buyer_supplier_and_status() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders.create_product(widget(SUPPLIER, Money::from_rm(10))).await.unwrap();
    let other = orders.create_product(widget(101, Money::from_rm(10))).await.unwrap();
    wallet.deposit(BUYER, Money::from_rm(30), "top up").await.unwrap();
    orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: BUYER }).await.unwrap();
    orders.place_order(NewOrderRequest { product_id: other.id, buyer_id: BUYER }).await.unwrap();
    orders.place_order(NewOrderRequest { product_id: product.id, buyer_id: 201 }).await.unwrap();

    let by_buyer = db.search_orders(OrderQueryFilter::default().with_buyer_id(BUYER)).await.unwrap();
    assert_eq!(by_buyer.len(), 2);
    let by_supplier = db.search_orders(OrderQueryFilter::default().with_supplier_id(SUPPLIER)).await.unwrap();
    assert_eq!(by_supplier.len(), 2);
    // Buyer 201 never deposited, so their order is on hold
    let on_hold = db.search_orders(OrderQueryFilter::default().with_status(OrderStatus::OnHold)).await.unwrap();
    assert_eq!(on_hold.len(), 1);
    assert_eq!(on_hold[0].buyer_id, 201);
}
