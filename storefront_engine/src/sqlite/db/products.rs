use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product},
    traits::StorefrontApiError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, StorefrontApiError> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (name, price, available_quantity) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.price)
    .bind(product.available_quantity)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products ORDER BY id ASC").fetch_all(conn).await?;
    Ok(products)
}

/// The guarded inventory decrement at the heart of order placement.
///
/// The quantity check lives in the WHERE clause, so the check and the decrement are one
/// atomic statement. Zero rows affected means the ledger could not satisfy the request;
/// the caller must abort its enclosing transaction.
pub async fn guarded_decrement(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, StorefrontApiError> {
    let result = sqlx::query(
        r#"
            UPDATE products
            SET available_quantity = available_quantity - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND available_quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    let decremented = result.rows_affected() > 0;
    trace!("📦️ Ledger decrement of {quantity} for product {product_id}: {}", if decremented { "ok" } else { "refused" });
    Ok(decremented)
}
