//! Typed views over the provider's webhook payloads.
//!
//! Stripe delivers every event as an envelope with a `type` string and a polymorphic
//! `data.object`. The envelope is deserialized eagerly; the inner object is kept as raw
//! JSON and only interpreted once the event type says what it is. Unknown fields are
//! ignored everywhere, since the provider adds fields (and whole event types) over time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CHECKOUT_SESSION_EXPIRED: &str = "checkout.session.expired";
pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.payment_failed";
pub const PAYMENT_INTENT_CANCELED: &str = "payment_intent.canceled";
pub const CHARGE_SUCCEEDED: &str = "charge.succeeded";
pub const CHARGE_FAILED: &str = "charge.failed";
pub const CHARGE_UPDATED: &str = "charge.updated";

/// The key under which the internal order id travels in provider metadata. Losing this
/// field makes an event unreconcilable, so it is set on both the checkout session and the
/// payment intent it spawns.
pub const ORDER_ID_METADATA_KEY: &str = "order_id";

//--------------------------------------    StripeEvent     ----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub object: Value,
}

impl StripeEvent {
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    pub fn is_checkout_session_event(&self) -> bool {
        self.event_type.starts_with("checkout.session.")
    }

    pub fn is_payment_intent_event(&self) -> bool {
        self.event_type.starts_with("payment_intent.")
    }

    pub fn is_charge_event(&self) -> bool {
        self.event_type.starts_with("charge.")
    }

    pub fn as_checkout_session(&self) -> Option<CheckoutSession> {
        serde_json::from_value(self.data.object.clone()).ok()
    }

    pub fn as_payment_intent(&self) -> Option<PaymentIntent> {
        serde_json::from_value(self.data.object.clone()).ok()
    }

    pub fn as_charge(&self) -> Option<Charge> {
        serde_json::from_value(self.data.object.clone()).ok()
    }

    /// The `order_id` metadata entry, wherever the event family keeps its metadata.
    pub fn metadata_order_id(&self) -> Option<String> {
        self.data.object.get("metadata")?.get(ORDER_ID_METADATA_KEY)?.as_str().map(String::from)
    }

    /// Best-effort payment-intent id for this event.
    ///
    /// Checkout-session events carry it nested under the session, payment-intent events as
    /// the object id, and charge events as the charge's linked `payment_intent` field.
    pub fn transaction_id(&self) -> Option<String> {
        let object = &self.data.object;
        if self.is_payment_intent_event() {
            object.get("id")?.as_str().map(String::from)
        } else if self.is_checkout_session_event() || self.is_charge_event() {
            object.get("payment_intent")?.as_str().map(String::from)
        } else {
            None
        }
    }
}

//--------------------------------------   CheckoutSession  ----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Total in minor currency units, as the provider reports it.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

//--------------------------------------   PaymentIntent    ----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub latest_charge: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

//--------------------------------------       Charge       ----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Charge {
    pub fn is_refunded(&self) -> bool {
        self.status.as_deref() == Some("refunded")
    }
}

//--------------------------------------  NewCheckoutSession --------------------------------------------------------
/// The subset of the session-creation response the gateway cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}
