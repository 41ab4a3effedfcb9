use std::fmt::Debug;

use log::*;
use sfg_common::Money;

use crate::{
    db_types::{NewPaymentEvent, Order, OrderId, Payment},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    traits::{StorefrontApiError, StorefrontDatabase},
};

/// `ReconciliationApi` drives the payment state machine in response to provider webhook
/// events and checkout registrations.
///
/// The state machine is deliberately monotonic: `Completed` and `Failed` absorb everything
/// that arrives after them. The provider's channel is at-least-once and unordered, so every
/// operation here is an idempotent no-op when it cannot apply, never an error the provider
/// could retry into a different outcome.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReconciliationApi<B>
where B: StorefrontDatabase
{
    /// Registers a checkout attempt: creates the order's payment record, or resets an
    /// existing one to `Pending` with the new session's transaction id. This is the one
    /// deliberate exception to the terminal-state rule (the retry-checkout path).
    pub async fn register_checkout(
        &self,
        order: &Order,
        transaction_id: &str,
        amount: Money,
        currency: &str,
    ) -> Result<Payment, StorefrontApiError> {
        let payment = self.db.create_or_reset_payment(order, transaction_id, amount, currency).await?;
        debug!("🔄️💳️ Checkout registered for order {} against [{transaction_id}]", order.id);
        Ok(payment)
    }

    /// Guarantees a payment record exists before a webhook event is reconciled, covering
    /// deliveries that beat checkout registration. No-op for unknown orders.
    pub async fn ensure_payment_mapping(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
    ) -> Result<Option<Payment>, StorefrontApiError> {
        self.db.ensure_payment_mapping(order_id, transaction_id).await
    }

    /// The success path. Completes the payment, marks the order `Paid` and fires the
    /// order-paid hook. A terminal or missing payment makes this a no-op. Amount and
    /// currency are optional in the provider's payloads; an omitted figure keeps what
    /// checkout registered rather than overwriting it.
    pub async fn mark_succeeded(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
        provider_status: &str,
        amount_minor: Option<i64>,
        currency: Option<&str>,
    ) -> Result<Option<Order>, StorefrontApiError> {
        trace!("🔄️✅️ Success signal for order {order_id} ([{transaction_id}], provider status '{provider_status}')");
        let Some((payment, order)) =
            self.db.mark_payment_succeeded(order_id, transaction_id, amount_minor, currency).await?
        else {
            return Ok(None);
        };
        debug!("🔄️✅️ Order {order_id} paid in full ({} {})", payment.amount, payment.currency);
        self.call_order_paid_hook(&order, &payment).await;
        Ok(Some(order))
    }

    /// The detail path. Records intermediate provider lifecycle state (e.g. an intent
    /// succeeding before the session completes) without declaring success.
    pub async fn update_provider_details(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
        provider_status: &str,
        amount_minor: Option<i64>,
        currency: Option<&str>,
        charge_id: Option<&str>,
    ) -> Result<Option<Payment>, StorefrontApiError> {
        trace!("🔄️💳️ Detail update for order {order_id}: provider status '{provider_status}'");
        self.db.update_provider_details(order_id, transaction_id, amount_minor, currency, charge_id).await
    }

    /// The failure path. Fails the payment, cancels the order and fires the order-annulled
    /// hook. A terminal or missing payment makes this a no-op, so a stale failure can never
    /// reverse a fulfilled order.
    pub async fn mark_failed(&self, order_id: &OrderId, reason: &str) -> Result<Option<Order>, StorefrontApiError> {
        trace!("🔄️❌️ Failure signal for order {order_id}: {reason}");
        let Some((_payment, order)) = self.db.mark_payment_failed(order_id, reason).await? else {
            return Ok(None);
        };
        self.call_order_annulled_hook(&order).await;
        Ok(Some(order))
    }

    /// The refund path. After completion the order moves to `Refunded` (the payment stays
    /// `Completed`); before completion the report is routed to the failure path. Either way
    /// the order-annulled hook fires.
    pub async fn mark_refunded(&self, order_id: &OrderId) -> Result<Option<Order>, StorefrontApiError> {
        trace!("🔄️↩️ Refund report for order {order_id}");
        let Some((_payment, order)) = self.db.mark_order_refunded(order_id).await? else {
            return Ok(None);
        };
        self.call_order_annulled_hook(&order).await;
        Ok(Some(order))
    }

    /// Appends the raw delivery to the audit log. Runs for every authenticated, parseable
    /// delivery regardless of whether it mutates any state.
    pub async fn record_event(&self, event: NewPaymentEvent) -> Result<i64, StorefrontApiError> {
        self.db.insert_payment_event(event).await
    }

    async fn call_order_paid_hook(&self, order: &Order, payment: &Payment) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📬️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone(), payment.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🔄️📬️ Notifying order annulled hook subscribers");
            let event = OrderAnnulledEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }
}
