use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentEvent, PaymentEvent},
    traits::StorefrontApiError,
};

/// Appends a raw provider delivery to the audit log. There is no dedup here; the log
/// records what was delivered, duplicates and all.
pub async fn insert_event(event: NewPaymentEvent, conn: &mut SqliteConnection) -> Result<i64, StorefrontApiError> {
    let result = sqlx::query(
        r#"
            INSERT INTO payment_events (transaction_id, event_type, payload) VALUES ($1, $2, $3);
        "#,
    )
    .bind(event.transaction_id)
    .bind(event.event_type)
    .bind(event.payload)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn fetch_events_for_transaction(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentEvent>, sqlx::Error> {
    let events = sqlx::query_as("SELECT * FROM payment_events WHERE transaction_id = $1 ORDER BY id ASC")
        .bind(transaction_id)
        .fetch_all(conn)
        .await?;
    Ok(events)
}
