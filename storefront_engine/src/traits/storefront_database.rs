use sfg_common::Money;
use thiserror::Error;

use crate::{
    db_types::{CartLine, NewPaymentEvent, NewProduct, NewUser, Order, OrderId, OrderStatus, Payment, Product, User},
    traits::StorefrontQuery,
};

/// The highest level of behaviour for backends supporting the storefront payment gateway.
///
/// This behaviour includes:
/// * Cart maintenance for the collaborating storefront UI.
/// * The atomic order placement flow (stock check, guarded decrement, price snapshots).
/// * Payment record management and the reconciliation state machine.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone + StorefrontQuery {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts a user record, or returns the existing record for the email address.
    async fn upsert_user(&self, user: NewUser) -> Result<User, StorefrontApiError>;

    /// Inserts a new product with its opening inventory level.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StorefrontApiError>;

    /// Adds a product to the user's cart, merging with an existing line for the same product.
    /// The given quantity replaces any previous quantity.
    async fn upsert_cart_line(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartLine, StorefrontApiError>;

    /// Removes a product from the user's cart. Returns the number of lines removed (0 or 1).
    async fn remove_cart_line(&self, user_id: i64, product_id: i64) -> Result<u64, StorefrontApiError>;

    /// Converts the user's cart into a durable order, in a single atomic transaction:
    /// * the user must exist, and the cart must be non-empty;
    /// * each cart line runs a guarded inventory decrement; a line that cannot be satisfied
    ///   aborts the whole transaction with [`StorefrontApiError::InsufficientStock`];
    /// * the order is inserted in `Pending` status with one immutable order line per cart
    ///   line, snapshotting the product price at this moment;
    /// * the cart is cleared.
    ///
    /// On any failure no order, order line or inventory mutation survives.
    async fn place_order(&self, user_id: i64) -> Result<Order, StorefrontApiError>;

    /// Explicitly sets the status of an order. This is the admin path (e.g. `Processing`,
    /// `Shipped`); reconciliation-driven transitions go through the payment methods below.
    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<Order, StorefrontApiError>;

    /// Registers a checkout attempt against the order.
    ///
    /// If no payment record exists for the order, a `Pending` one is inserted. Otherwise the
    /// existing record's transaction id, amount and currency are overwritten and its status
    /// is reset to `Pending`. The reset is deliberately unconditional, including for
    /// previously `Failed` payments; callers police whether a retry is allowed.
    async fn create_or_reset_payment(
        &self,
        order: &Order,
        transaction_id: &str,
        amount: Money,
        currency: &str,
    ) -> Result<Payment, StorefrontApiError>;

    /// Guarantees a payment record exists for the order before reconciliation runs, covering
    /// the case where the first webhook delivery beats checkout registration. The record is
    /// seeded from the order's own total. Returns `None` when the order is unknown.
    async fn ensure_payment_mapping(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
    ) -> Result<Option<Payment>, StorefrontApiError>;

    /// Transitions the payment to `Completed` and the linked order to `Paid`.
    ///
    /// The amount is recorded from the provider's minor-unit figure and the currency is
    /// stored uppercased; a figure the provider omitted (`None`) leaves the stored value
    /// untouched. The transition only fires while the payment is `Pending`; a terminal
    /// payment, or a missing one, makes this a silent no-op and `None` is returned. The
    /// guard runs in SQL so concurrent deliveries for the same order cannot both apply it.
    async fn mark_payment_succeeded(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
        amount_minor: Option<i64>,
        currency: Option<&str>,
    ) -> Result<Option<(Payment, Order)>, StorefrontApiError>;

    /// Records intermediate provider lifecycle detail (transaction id, amount, currency,
    /// optionally a charge id) without changing the payment or order status. Omitted
    /// figures leave the stored values untouched. No-op once the payment is terminal, so
    /// a completed payment's recorded detail is never downgraded.
    async fn update_provider_details(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
        amount_minor: Option<i64>,
        currency: Option<&str>,
        charge_id: Option<&str>,
    ) -> Result<Option<Payment>, StorefrontApiError>;

    /// Transitions the payment to `Failed` and the linked order to `Cancelled`. No-op once
    /// the payment is terminal, so a stale failure retry can never reverse a fulfilled order.
    async fn mark_payment_failed(&self, order_id: &OrderId, reason: &str)
        -> Result<Option<(Payment, Order)>, StorefrontApiError>;

    /// Handles a provider-side refund report.
    ///
    /// A refund arriving after the payment completed moves the order to `Refunded` and
    /// leaves the payment `Completed` (the money did flow, and then flowed back). A refund
    /// report against a payment that never completed is routed to the failure path instead.
    async fn mark_order_refunded(&self, order_id: &OrderId) -> Result<Option<(Payment, Order)>, StorefrontApiError>;

    /// Appends a raw provider delivery to the audit log. Unconditional; the log is never
    /// deduplicated.
    async fn insert_payment_event(&self, event: NewPaymentEvent) -> Result<i64, StorefrontApiError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StorefrontApiError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum StorefrontApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Cannot place an order from an empty cart")]
    EmptyCart,
    #[error("Insufficient stock for product '{product}'")]
    InsufficientStock { product: String },
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("The requested user {0} does not exist")]
    UserNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Quantity must be at least 1, got {0}")]
    QuantityInvalid(i64),
    #[error("Monetary amount overflows the ledger's integer representation")]
    AmountOverflow,
}

impl From<sqlx::Error> for StorefrontApiError {
    fn from(e: sqlx::Error) -> Self {
        StorefrontApiError::DatabaseError(e.to_string())
    }
}
