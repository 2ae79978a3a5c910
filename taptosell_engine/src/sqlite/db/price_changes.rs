use sqlx::SqliteConnection;

use crate::{
    db_types::{Money, PriceChangeRequest, PriceChangeStatus},
    traits::MarketplaceError,
};

pub async fn insert_request(
    product_id: i64,
    requested_price: Money,
    conn: &mut SqliteConnection,
) -> Result<PriceChangeRequest, MarketplaceError> {
    let request: PriceChangeRequest = sqlx::query_as(
        r#"
            INSERT INTO price_change_requests (product_id, requested_price)
            VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(product_id)
    .bind(requested_price)
    .fetch_one(conn)
    .await?;
    Ok(request)
}

pub async fn fetch_request(id: i64, conn: &mut SqliteConnection) -> Result<Option<PriceChangeRequest>, sqlx::Error> {
    let request =
        sqlx::query_as("SELECT * FROM price_change_requests WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(request)
}

/// Resolves a pending request. The WHERE guard means a request can only be resolved once.
pub async fn resolve_guarded(
    id: i64,
    resolution: PriceChangeStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<PriceChangeRequest>, MarketplaceError> {
    let result: Option<PriceChangeRequest> = sqlx::query_as(
        r#"
            UPDATE price_change_requests SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'pcr-pending'
            RETURNING *;
        "#,
    )
    .bind(resolution)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}
