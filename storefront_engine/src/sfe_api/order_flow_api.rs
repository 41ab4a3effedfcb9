use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartLine, NewProduct, NewUser, Order, OrderId, OrderStatus, Product, User},
    sfe_api::order_objects::{OrderQueryFilter, OrderResult},
    traits::{StorefrontApiError, StorefrontDatabase},
};

/// `OrderFlowApi` is the primary API for the synchronous, caller-facing half of the gateway:
/// cart maintenance, the atomic order placement flow, and order queries. The asynchronous
/// half (provider reconciliation) lives in [`crate::ReconciliationApi`].
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: StorefrontDatabase
{
    pub async fn register_user(&self, user: NewUser) -> Result<User, StorefrontApiError> {
        self.db.upsert_user(user).await
    }

    pub async fn list_product(&self, product: NewProduct) -> Result<Product, StorefrontApiError> {
        self.db.insert_product(product).await
    }

    pub async fn products(&self) -> Result<Vec<Product>, StorefrontApiError> {
        self.db.fetch_products().await
    }

    pub async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartLine, StorefrontApiError> {
        let line = self.db.upsert_cart_line(user_id, product_id, quantity).await?;
        debug!("🔄️🛒️ Cart line for user {user_id}: product {product_id} x{quantity}");
        Ok(line)
    }

    pub async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> Result<u64, StorefrontApiError> {
        let removed = self.db.remove_cart_line(user_id, product_id).await?;
        debug!("🔄️🛒️ Removed {removed} cart line(s) for user {user_id}, product {product_id}");
        Ok(removed)
    }

    pub async fn cart_for_user(&self, user_id: i64) -> Result<Vec<CartLine>, StorefrontApiError> {
        self.db.fetch_cart(user_id).await
    }

    /// Converts the user's cart into a `Pending` order. All the heavy lifting (guarded
    /// inventory decrements, price snapshots, cart clearing) happens atomically in the
    /// backend; see [`StorefrontDatabase::place_order`].
    pub async fn place_order(&self, user_id: i64) -> Result<Order, StorefrontApiError> {
        let order = self.db.place_order(user_id).await?;
        info!("🔄️📦️ Order {} placed for user {user_id}. Total: {}", order.id, order.total_amount);
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StorefrontApiError> {
        self.db.fetch_order(order_id).await
    }

    /// The order with its line snapshots, or `None` if the order does not exist.
    pub async fn order_with_lines(&self, order_id: &OrderId) -> Result<Option<OrderResult>, StorefrontApiError> {
        let Some(order) = self.db.fetch_order(order_id).await? else {
            return Ok(None);
        };
        let lines = self.db.fetch_order_lines(order_id).await?;
        Ok(Some(OrderResult { order, lines }))
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StorefrontApiError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StorefrontApiError> {
        trace!("🔄️📦️ Searching orders. {query}");
        self.db.search_orders(query).await
    }

    /// Admin path for explicit fulfilment transitions (`Processing`, `Shipped`, ...).
    /// Payment-driven transitions never come through here.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, StorefrontApiError> {
        let order = self.db.update_order_status(order_id, status).await?;
        info!("🔄️📦️ Order {order_id} moved to {status}");
        Ok(order)
    }
}
