use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Order, OrderId, OrderLine, OrderStatus},
    sfe_api::order_objects::OrderQueryFilter,
    traits::StorefrontApiError,
};

/// Inserts a new `Pending` order. This is not atomic on its own; the placement flow embeds
/// this call inside its transaction and passes `&mut *tx` as the connection argument.
pub async fn insert_order(
    user_id: i64,
    total_amount: sfg_common::Money,
    conn: &mut SqliteConnection,
) -> Result<Order, StorefrontApiError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, total_amount, status) VALUES ($1, $2, 'Pending')
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(total_amount)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn insert_order_line(
    order_id: &OrderId,
    product_id: i64,
    quantity: i64,
    unit_price: sfg_common::Money,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, StorefrontApiError> {
    let line = sqlx::query_as(
        r#"
            INSERT INTO order_lines (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .fetch_one(conn)
    .await?;
    Ok(line)
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_lines(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, StorefrontApiError> {
    let status = status.to_string();
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(order_id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(StorefrontApiError::OrderNotFound(*order_id))
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
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.status.as_ref().unwrap().iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
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
    Ok(orders)
}
