use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderStatus},
    traits::MarketplaceError,
    tts_api::order_objects::OrderQueryFilter,
};

/// Inserts a new order. Orders always start life `on-hold`; the placement flow promotes them to
/// `processing` in the same transaction once the debit has landed.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, MarketplaceError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (product_id, buyer_id, cost)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order.product_id)
    .bind(order.buyer_id)
    .bind(order.cost)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order #{} inserted for buyer #{} at {}", order.id, order.buyer_id, order.cost);
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Moves an order from `from` to `to` in a single guarded UPDATE. The WHERE clause re-checks the
/// current status, so the transition only happens if the order is still in the expected state at
/// write time. Returns `None` when the guard did not match (wrong status or no such order).
///
/// Callers must have vetted the transition against [`OrderStatus::can_transition_to`] first; this
/// function enforces the precondition at the storage layer, not the legality of the edge.
pub async fn update_order_status_guarded(
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketplaceError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(to)
    .bind(id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

pub async fn set_tracking_number(
    id: i64,
    tracking_number: &str,
    conn: &mut SqliteConnection,
) -> Result<(), MarketplaceError> {
    sqlx::query("UPDATE orders SET tracking_number = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(tracking_number)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("product_id = ");
        where_clause.push_bind_unseparated(product_id);
    }
    if let Some(supplier_id) = query.supplier_id {
        where_clause.push("product_id IN (SELECT id FROM products WHERE supplier_id = ");
        where_clause.push_bind_unseparated(supplier_id);
        where_clause.push_unseparated(")");
    }
    if let Some(statuses) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status_clause = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("Result of search_orders: {:?}", orders.len());
    Ok(orders)
}
