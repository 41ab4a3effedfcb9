use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatus, Payment};

/// Fired after a payment is reconciled as `Completed` and the order has moved to `Paid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

/// Fired after an order leaves the happy path: payment failure (`Cancelled`) or a
/// provider-side refund (`Refunded`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatus,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}
