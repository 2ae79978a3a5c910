use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Money, NewProduct, Product},
    traits::MarketplaceError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, MarketplaceError> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (supplier_id, name, price, stock, is_variable)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(product.supplier_id)
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.is_variable)
    .fetch_one(conn)
    .await?;
    debug!("📦️ Product #{} '{}' listed by supplier #{}", product.id, product.name, product.supplier_id);
    Ok(product)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

/// Decrements stock by one for non-variable products. Variable (multi-SKU) products have no single
/// stock count and are left alone.
pub async fn decrement_stock(id: i64, conn: &mut SqliteConnection) -> Result<(), MarketplaceError> {
    sqlx::query(
        "UPDATE products SET stock = stock - 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND is_variable = 0",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_price(id: i64, price: Money, conn: &mut SqliteConnection) -> Result<(), MarketplaceError> {
    sqlx::query("UPDATE products SET price = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(price)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
