//! Payment-row queries, including the terminal-state guards of the reconciliation state
//! machine. The guards live in the WHERE clauses (`AND status = 'Pending'`) so the check
//! and the transition are one atomic statement; two concurrent deliveries for the same
//! order cannot both pass it.
use log::debug;
use sfg_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderId, Payment},
    traits::StorefrontApiError,
};

pub async fn fetch_payment_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_by_transaction_id(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// Registers a checkout attempt. Inserts a `Pending` payment for the order, or overwrites
/// the existing record's transaction id, amount and currency and resets it to `Pending`.
/// The reset is unconditional, bypassing the terminal-state guard on purpose: this is the
/// retry-checkout path, and callers police whether a retry is permitted.
pub async fn upsert_checkout_payment(
    order: &Order,
    transaction_id: &str,
    amount: Money,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, StorefrontApiError> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, user_id, transaction_id, amount, currency, status)
            VALUES ($1, $2, $3, $4, $5, 'Pending')
            ON CONFLICT (order_id) DO UPDATE SET
                transaction_id = excluded.transaction_id,
                amount = excluded.amount,
                currency = excluded.currency,
                status = 'Pending',
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(transaction_id)
    .bind(amount)
    .bind(currency)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

/// Inserts a `Pending` payment seeded from the order's own total if none exists yet.
/// Unlike [`upsert_checkout_payment`], an existing record is left completely untouched.
pub async fn insert_payment_if_missing(
    order: &Order,
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, StorefrontApiError> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, user_id, transaction_id, amount, currency, status)
            VALUES ($1, $2, $3, $4, $5, 'Pending')
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(transaction_id)
    .bind(order.total_amount)
    .bind(sfg_common::DEFAULT_CURRENCY_CODE)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Completes the payment, recording the provider's transaction id, amount and currency.
/// A `None` amount or currency keeps the registered value; the provider treats those
/// fields as optional and an omission is not a zero. Only fires while the payment is
/// `Pending`; returns `None` otherwise.
pub async fn mark_succeeded(
    order_id: &OrderId,
    transaction_id: &str,
    amount: Option<Money>,
    currency: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, StorefrontApiError> {
    let payment: Option<Payment> = sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'Completed',
                transaction_id = $2,
                amount = COALESCE($3, amount),
                currency = COALESCE($4, currency),
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(transaction_id)
    .bind(amount)
    .bind(currency)
    .fetch_optional(conn)
    .await?;
    if payment.is_none() {
        debug!("🗃️💰️ Payment for order {order_id} is absent or already terminal. Success signal ignored.");
    }
    Ok(payment)
}

/// Records intermediate provider detail without touching the status. Same guard and
/// omitted-field handling as [`mark_succeeded`].
pub async fn update_provider_details(
    order_id: &OrderId,
    transaction_id: &str,
    amount: Option<Money>,
    currency: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, StorefrontApiError> {
    let payment: Option<Payment> = sqlx::query_as(
        r#"
            UPDATE payments
            SET transaction_id = $2,
                amount = COALESCE($3, amount),
                currency = COALESCE($4, currency),
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(transaction_id)
    .bind(amount)
    .bind(currency)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Fails the payment. Only fires while the payment is `Pending`; returns `None` otherwise,
/// so a stale failure signal can never reverse a completed payment.
pub async fn mark_failed(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Payment>, StorefrontApiError> {
    let payment: Option<Payment> = sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'Failed', updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}
