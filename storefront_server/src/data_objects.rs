use serde::{Deserialize, Serialize};
use storefront_engine::db_types::{OrderId, OrderStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Body for `POST /api/cart`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineRequest {
    pub product_id: i64,
    pub quantity: i64,
}

/// Body for `POST /api/checkout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
}

/// Returned from `POST /api/checkout`: where to send the shopper next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

/// Body for `POST /api/orders/{id}/status` (admin fulfilment transitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdateRequest {
    pub status: OrderStatus,
}
