//! Stripe integration tools for the storefront payment gateway.
//!
//! Everything that talks the provider's language lives here:
//! * [`StripeApi`]: a thin REST client for creating checkout sessions. Every session and
//!   payment intent it creates carries an `order_id` metadata entry; that field is the join
//!   key the webhook ingestor uses to map provider events back onto internal orders.
//! * [`data_objects`]: typed views over the event envelopes Stripe delivers to the webhook
//!   endpoint (checkout sessions, payment intents, charges).
//! * [`webhook`]: `Stripe-Signature` header verification. This is the sole authentication
//!   boundary for the webhook endpoint, so it gets its own well-tested module.

mod api;
mod config;
pub mod data_objects;
mod error;
pub mod webhook;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{Charge, CheckoutSession, NewCheckoutSession, PaymentIntent, StripeEvent};
pub use error::StripeApiError;
