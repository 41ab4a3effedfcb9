//! `SqliteDatabase` is a concrete implementation of a storefront gateway backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the traits defined in the
//! [`crate::traits`] module. Every multi-step mutation runs inside a single `pool.begin()`
//! transaction; an early return drops the transaction and rolls everything back.
use std::fmt::Debug;

use log::*;
use sfg_common::Money;
use sqlx::SqlitePool;

use super::db::{carts, db_url, new_pool, orders, payment_events, payments, products, users};
use crate::{
    db_types::{
        CartLine,
        NewPaymentEvent,
        NewProduct,
        NewUser,
        Order,
        OrderId,
        OrderLine,
        OrderStatus,
        Payment,
        PaymentEvent,
        PaymentStatus,
        Product,
        User,
    },
    sfe_api::order_objects::OrderQueryFilter,
    traits::{StorefrontApiError, StorefrontDatabase, StorefrontQuery},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        users::upsert_user(user, &mut conn).await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product '{}' listed with id {} and {} units in stock", product.name, product.id, product.available_quantity);
        Ok(product)
    }

    async fn upsert_cart_line(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartLine, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_id, &mut conn)
            .await?
            .ok_or(StorefrontApiError::ProductNotFound(product_id))?;
        carts::upsert_cart_line(user_id, product_id, quantity, &mut conn).await
    }

    async fn remove_cart_line(&self, user_id: i64, product_id: i64) -> Result<u64, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::remove_cart_line(user_id, product_id, &mut conn).await
    }

    async fn place_order(&self, user_id: i64) -> Result<Order, StorefrontApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::fetch_user(user_id, &mut tx).await?.ok_or(StorefrontApiError::UserNotFound(user_id))?;
        let cart = carts::fetch_cart(user_id, &mut tx).await?;
        if cart.is_empty() {
            return Err(StorefrontApiError::EmptyCart);
        }
        let mut total = Money::default();
        let mut snapshots = Vec::with_capacity(cart.len());
        for line in &cart {
            let product = products::fetch_product(line.product_id, &mut tx)
                .await?
                .ok_or(StorefrontApiError::ProductNotFound(line.product_id))?;
            // Check and decrement are one guarded statement. A refusal aborts the whole
            // placement; dropping the transaction rolls back earlier decrements.
            let decremented = products::guarded_decrement(product.id, line.quantity, &mut tx).await?;
            if !decremented {
                debug!("🗃️📦️ Placement for user {user_id} aborted: insufficient stock for '{}'", product.name);
                return Err(StorefrontApiError::InsufficientStock { product: product.name });
            }
            let line_total = product.price.checked_mul(line.quantity).ok_or(StorefrontApiError::AmountOverflow)?;
            total = total.checked_add(line_total).ok_or(StorefrontApiError::AmountOverflow)?;
            snapshots.push((product, line.quantity));
        }
        let order = orders::insert_order(user.id, total, &mut tx).await?;
        for (product, quantity) in snapshots {
            orders::insert_order_line(&order.id, product.id, quantity, product.price, &mut tx).await?;
        }
        carts::clear_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️📦️ Order {} placed for user {user_id} with total {total}", order.id);
        Ok(order)
    }

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<Order, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(order_id, status, &mut conn).await?;
        debug!("🗃️📦️ Order {order_id} status set to {status}");
        Ok(order)
    }

    async fn create_or_reset_payment(
        &self,
        order: &Order,
        transaction_id: &str,
        amount: Money,
        currency: &str,
    ) -> Result<Payment, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::upsert_checkout_payment(order, transaction_id, amount, currency, &mut conn).await?;
        debug!("🗃️💰️ Payment for order {} registered against transaction [{transaction_id}]", order.id);
        Ok(payment)
    }

    async fn ensure_payment_mapping(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
    ) -> Result<Option<Payment>, StorefrontApiError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::fetch_order(order_id, &mut tx).await? else {
            debug!("🗃️💰️ No order {order_id} on file. Mapping for [{transaction_id}] skipped.");
            return Ok(None);
        };
        if let Some(payment) = payments::insert_payment_if_missing(&order, transaction_id, &mut tx).await? {
            debug!("🗃️💰️ Webhook arrived before checkout registration. Payment seeded for order {order_id}.");
            tx.commit().await?;
            return Ok(Some(payment));
        }
        let payment = payments::fetch_payment_for_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn mark_payment_succeeded(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
        amount_minor: Option<i64>,
        currency: Option<&str>,
    ) -> Result<Option<(Payment, Order)>, StorefrontApiError> {
        let mut tx = self.pool.begin().await?;
        let amount = amount_minor.map(Money::from_cents);
        let currency = currency.map(sfg_common::helpers::normalize_currency);
        let Some(payment) =
            payments::mark_succeeded(order_id, transaction_id, amount, currency.as_deref(), &mut tx).await?
        else {
            return Ok(None);
        };
        let order = orders::update_order_status(order_id, OrderStatus::Paid, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️💰️ Payment [{transaction_id}] completed. Order {order_id} is now Paid.");
        Ok(Some((payment, order)))
    }

    async fn update_provider_details(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
        amount_minor: Option<i64>,
        currency: Option<&str>,
        charge_id: Option<&str>,
    ) -> Result<Option<Payment>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let amount = amount_minor.map(Money::from_cents);
        let currency = currency.map(sfg_common::helpers::normalize_currency);
        let payment =
            payments::update_provider_details(order_id, transaction_id, amount, currency.as_deref(), &mut conn).await?;
        match (&payment, charge_id) {
            (Some(_), Some(charge)) => {
                trace!("🗃️💰️ Provider detail for order {order_id} updated (charge {charge})")
            },
            (Some(_), None) => trace!("🗃️💰️ Provider detail for order {order_id} updated"),
            (None, _) => debug!("🗃️💰️ Detail update for order {order_id} ignored: payment absent or terminal"),
        }
        Ok(payment)
    }

    async fn mark_payment_failed(
        &self,
        order_id: &OrderId,
        reason: &str,
    ) -> Result<Option<(Payment, Order)>, StorefrontApiError> {
        let mut tx = self.pool.begin().await?;
        let Some(payment) = payments::mark_failed(order_id, &mut tx).await? else {
            debug!("🗃️💰️ Failure signal for order {order_id} ignored: payment absent or terminal");
            return Ok(None);
        };
        let order = orders::update_order_status(order_id, OrderStatus::Cancelled, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️💰️ Payment for order {order_id} failed ({reason}). Order cancelled.");
        Ok(Some((payment, order)))
    }

    async fn mark_order_refunded(&self, order_id: &OrderId) -> Result<Option<(Payment, Order)>, StorefrontApiError> {
        let mut tx = self.pool.begin().await?;
        let Some(payment) = payments::fetch_payment_for_order(order_id, &mut tx).await? else {
            debug!("🗃️💰️ Refund report for order {order_id} ignored: no payment on file");
            return Ok(None);
        };
        let result = match payment.status {
            PaymentStatus::Completed => {
                // The payment itself stays Completed: the charge did settle before the
                // provider reversed it.
                let order = orders::update_order_status(order_id, OrderStatus::Refunded, &mut tx).await?;
                info!("🗃️💰️ Order {order_id} refunded by the provider after completion.");
                Some((payment, order))
            },
            status if status.is_terminal() => {
                debug!("🗃️💰️ Refund report for order {order_id} ignored: payment already {status}");
                None
            },
            _ => {
                let Some(payment) = payments::mark_failed(order_id, &mut tx).await? else {
                    return Ok(None);
                };
                let order = orders::update_order_status(order_id, OrderStatus::Cancelled, &mut tx).await?;
                info!("🗃️💰️ Refund report for order {order_id} arrived before completion. Routed to the failure path.");
                Some((payment, order))
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn insert_payment_event(&self, event: NewPaymentEvent) -> Result<i64, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let id = payment_events::insert_event(event, &mut conn).await?;
        trace!("🗃️📬️ Provider delivery appended to the audit log with id {id}");
        Ok(id)
    }

    async fn close(&mut self) -> Result<(), StorefrontApiError> {
        self.pool.close().await;
        Ok(())
    }
}

impl StorefrontQuery for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let product_list = products::fetch_products(&mut conn).await?;
        Ok(product_list)
    }

    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartLine>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart(user_id, &mut conn).await?;
        Ok(cart)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let order_list = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(order_list)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let order_list = orders::search_orders(query, &mut conn).await?;
        Ok(order_list)
    }

    async fn fetch_payment_for_order(&self, order_id: &OrderId) -> Result<Option<Payment>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_transaction_id(transaction_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_events(&self, transaction_id: &str) -> Result<Vec<PaymentEvent>, StorefrontApiError> {
        let mut conn = self.pool.acquire().await?;
        let events = payment_events::fetch_events_for_transaction(transaction_id, &mut conn).await?;
        Ok(events)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
