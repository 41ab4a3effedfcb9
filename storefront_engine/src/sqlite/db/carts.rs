use sqlx::SqliteConnection;

use crate::{db_types::CartLine, traits::StorefrontApiError};

/// Adds a product to the user's cart. A line for the same product is replaced, not summed;
/// the caller sends the full desired quantity.
pub async fn upsert_cart_line(
    user_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartLine, StorefrontApiError> {
    if quantity < 1 {
        return Err(StorefrontApiError::QuantityInvalid(quantity));
    }
    let line = sqlx::query_as(
        r#"
            INSERT INTO cart_lines (user_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = excluded.quantity
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(line)
}

pub async fn remove_cart_line(
    user_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, StorefrontApiError> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM cart_lines WHERE user_id = $1 ORDER BY id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

pub async fn clear_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, StorefrontApiError> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}
