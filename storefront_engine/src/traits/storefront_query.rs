use crate::{
    db_types::{CartLine, Order, OrderId, OrderLine, Payment, PaymentEvent, Product, User},
    sfe_api::order_objects::OrderQueryFilter,
    traits::StorefrontApiError,
};

/// Read-only lookups over the storefront database. Missing records are `None`, not errors;
/// the reconciliation flow leans on this to turn unknown-order deliveries into no-ops.
#[allow(async_fn_in_trait)]
pub trait StorefrontQuery {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, StorefrontApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StorefrontApiError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StorefrontApiError>;

    async fn fetch_products(&self) -> Result<Vec<Product>, StorefrontApiError>;

    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartLine>, StorefrontApiError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StorefrontApiError>;

    async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, StorefrontApiError>;

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StorefrontApiError>;

    /// Fetches orders according to the criteria in the filter, ordered by creation time.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StorefrontApiError>;

    async fn fetch_payment_for_order(&self, order_id: &OrderId) -> Result<Option<Payment>, StorefrontApiError>;

    async fn fetch_payment_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>, StorefrontApiError>;

    /// The audit trail for a provider transaction, oldest first.
    async fn fetch_payment_events(&self, transaction_id: &str) -> Result<Vec<PaymentEvent>, StorefrontApiError>;
}
