//! The provider webhook endpoint and checkout-session plumbing.
//!
//! The webhook route is the asynchronous half of the gateway. Authentication is the HMAC
//! signature over the raw body; a delivery that fails verification is rejected with a 400
//! before anything is parsed or written. Once authenticated, the delivery is appended to
//! the audit log and dispatched onto the reconciliation engine, and the response is always
//! a 200. The provider redelivers on any non-2xx, and a redelivery can never change the
//! outcome here (the state machine is idempotent), so erroring would only generate noise.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::*;
use sfg_common::Money;
use storefront_engine::{
    db_types::{NewPaymentEvent, OrderId},
    ReconciliationApi,
    StorefrontDatabase,
};
use stripe_tools::{
    data_objects::{
        CHARGE_FAILED,
        CHARGE_SUCCEEDED,
        CHARGE_UPDATED,
        CHECKOUT_SESSION_COMPLETED,
        CHECKOUT_SESSION_EXPIRED,
        PAYMENT_INTENT_CANCELED,
        PAYMENT_INTENT_FAILED,
        PAYMENT_INTENT_SUCCEEDED,
    },
    webhook::{verify_signature, DEFAULT_TOLERANCE, SIGNATURE_HEADER},
    NewCheckoutSession,
    StripeApi,
    StripeApiError,
    StripeConfig,
    StripeEvent,
};

use crate::{data_objects::JsonResponse, routes::route};

//--------------------------------------  CheckoutProvider  ----------------------------------------------------------
/// The one provider call the shopping API makes. A trait seam so that endpoint tests can
/// stub session creation out instead of talking to the real REST API.
#[allow(async_fn_in_trait)]
pub trait CheckoutProvider: Clone {
    async fn create_checkout_session(
        &self,
        amount: Money,
        currency: &str,
        order_id: &str,
        description: &str,
    ) -> Result<NewCheckoutSession, StripeApiError>;
}

impl CheckoutProvider for StripeApi {
    async fn create_checkout_session(
        &self,
        amount: Money,
        currency: &str,
        order_id: &str,
        description: &str,
    ) -> Result<NewCheckoutSession, StripeApiError> {
        StripeApi::create_checkout_session(self, amount, currency, order_id, description).await
    }
}

//--------------------------------------   Webhook route    ----------------------------------------------------------
route!(stripe_webhook => Post "/webhook/stripe" impl StorefrontDatabase);

/// Receives a webhook delivery from the provider.
///
/// The raw body bytes are taken unparsed because the signature covers them exactly as sent;
/// running the payload through a JSON extractor first would break verification.
pub async fn stripe_webhook<B: StorefrontDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B>>,
    config: web::Data<StripeConfig>,
) -> HttpResponse {
    trace!("📬️ Received webhook delivery ({} bytes)", body.len());
    let Some(header) = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        warn!("📬️ Webhook delivery without a {SIGNATURE_HEADER} header was rejected");
        return HttpResponse::BadRequest().json(JsonResponse::failure("Invalid signature"));
    };
    if let Err(e) = verify_signature(&body, header, config.webhook_secret.reveal(), DEFAULT_TOLERANCE, Utc::now()) {
        warn!("📬️ Webhook delivery failed signature verification: {e}");
        return HttpResponse::BadRequest().json(JsonResponse::failure("Invalid signature"));
    }
    let event = match StripeEvent::from_payload(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("📬️ Authenticated webhook delivery could not be parsed: {e}");
            return HttpResponse::BadRequest().json(JsonResponse::failure("Invalid payload"));
        },
    };
    let payload = String::from_utf8_lossy(&body);
    handle_stripe_event(event, &payload, api.as_ref()).await
}

/// Audits and dispatches an authenticated, parsed provider event.
///
/// Reconciliation errors are logged and absorbed rather than returned. By this point the
/// delivery is authenticated and recorded, and a 5xx would only trigger redeliveries that
/// the idempotent state machine would no-op anyway.
pub async fn handle_stripe_event<B: StorefrontDatabase>(
    event: StripeEvent,
    payload: &str,
    api: &ReconciliationApi<B>,
) -> HttpResponse {
    let transaction_id = event.transaction_id();
    let order_id = event.metadata_order_id().and_then(|id| id.parse::<OrderId>().ok());
    debug!("📬️ {} delivery {} (order: {order_id:?}, txn: {transaction_id:?})", event.event_type, event.id);

    if let (Some(order_id), Some(txn)) = (order_id.as_ref(), transaction_id.as_deref()) {
        // A delivery can beat the checkout registration; seed the mapping if it is missing.
        if let Err(e) = api.ensure_payment_mapping(order_id, txn).await {
            error!("📬️ Could not ensure a payment mapping for order {order_id}. {e}");
        }
    }

    // Every authenticated delivery lands in the log, including duplicates, events with no
    // order mapping and event types the dispatcher ignores.
    let audit = NewPaymentEvent::new(transaction_id.clone(), &event.event_type, payload);
    if let Err(e) = api.record_event(audit).await {
        error!("📬️ Could not append delivery {} to the audit log. {e}", event.id);
    }

    let Some(order_id) = order_id else {
        // Nothing to reconcile against. Charge events for payments created outside this
        // system legitimately have no order metadata.
        debug!("📬️ Delivery {} carries no order id and was logged only", event.id);
        return received();
    };

    let outcome = match event.event_type.as_str() {
        CHECKOUT_SESSION_COMPLETED => {
            match (transaction_id.as_deref(), event.as_checkout_session()) {
                (Some(txn), Some(session)) => {
                    // amount_total and currency are optional on the session object. Absent
                    // fields must not overwrite the registered figures.
                    let amount = session.amount_total;
                    let currency = session.currency.as_deref();
                    let status = session.payment_status.as_deref().unwrap_or("paid");
                    api.mark_succeeded(&order_id, txn, status, amount, currency).await.map(|order| {
                        if order.is_none() {
                            debug!("📬️ Success signal for order {order_id} was absorbed (terminal or unknown)");
                        }
                    })
                },
                _ => {
                    warn!("📬️ {CHECKOUT_SESSION_COMPLETED} delivery {} is missing its session object", event.id);
                    Ok(())
                },
            }
        },
        CHECKOUT_SESSION_EXPIRED => api.mark_failed(&order_id, CHECKOUT_SESSION_EXPIRED).await.map(|_| ()),
        PAYMENT_INTENT_SUCCEEDED => match event.as_payment_intent() {
            Some(intent) => {
                let status = intent.status.as_deref().unwrap_or("succeeded");
                let amount = intent.amount;
                let currency = intent.currency.as_deref();
                api.update_provider_details(&order_id, &intent.id, status, amount, currency, intent.latest_charge.as_deref())
                    .await
                    .map(|_| ())
            },
            None => {
                warn!("📬️ {PAYMENT_INTENT_SUCCEEDED} delivery {} is missing its intent object", event.id);
                Ok(())
            },
        },
        PAYMENT_INTENT_FAILED | PAYMENT_INTENT_CANCELED => {
            api.mark_failed(&order_id, &event.event_type).await.map(|_| ())
        },
        CHARGE_SUCCEEDED | CHARGE_FAILED => {
            // Advisory only. The session and intent events are authoritative for outcomes.
            debug!("📬️ Advisory {} delivery for order {order_id}", event.event_type);
            Ok(())
        },
        CHARGE_UPDATED => match event.as_charge() {
            Some(charge) if charge.is_refunded() => api.mark_refunded(&order_id).await.map(|_| ()),
            _ => {
                debug!("📬️ {CHARGE_UPDATED} delivery for order {order_id} does not report a refund");
                Ok(())
            },
        },
        other => {
            debug!("📬️ Unhandled event type '{other}' was logged and dropped");
            Ok(())
        },
    };
    if let Err(e) = outcome {
        error!("📬️ Reconciliation of delivery {} for order {order_id} failed. {e}", event.id);
    }
    received()
}

fn received() -> HttpResponse {
    HttpResponse::Ok().json(JsonResponse::success("Received"))
}
