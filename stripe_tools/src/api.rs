use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use sfg_common::Money;

use crate::{config::StripeConfig, data_objects::NewCheckoutSession, StripeApiError};

/// A minimal client for the provider's REST API.
///
/// Only the session-creation call is needed by the gateway; everything else the provider
/// does (capture, refunds, disputes) reaches this system through the webhook channel.
#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Creates a hosted checkout session for the given order total.
    ///
    /// The internal order id is attached as `metadata[order_id]` on both the session and
    /// the payment intent it spawns, so that every subsequent provider event can be mapped
    /// back to the order without any server-side session bookkeeping.
    pub async fn create_checkout_session(
        &self,
        amount: Money,
        currency: &str,
        order_id: &str,
        description: &str,
    ) -> Result<NewCheckoutSession, StripeApiError> {
        if amount.value() <= 0 {
            return Err(StripeApiError::InvalidCurrencyAmount(amount.to_string()));
        }
        let url = format!("{}/checkout/sessions", self.config.api_base);
        let amount_minor = amount.value().to_string();
        let currency = currency.to_ascii_lowercase();
        // The provider expects form-encoded bodies with bracketed nested keys.
        let form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", self.config.success_url.as_str()),
            ("cancel_url", self.config.cancel_url.as_str()),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", currency.as_str()),
            ("line_items[0][price_data][unit_amount]", amount_minor.as_str()),
            ("line_items[0][price_data][product_data][name]", description),
            ("metadata[order_id]", order_id),
            ("payment_intent_data[metadata][order_id]", order_id),
        ];
        trace!("Creating checkout session for order {order_id} ({amount} {currency})");
        let response =
            self.client.post(url).form(&form).send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            let session =
                response.json::<NewCheckoutSession>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))?;
            debug!("Checkout session {} created for order {order_id}", session.id);
            Ok(session)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }
}
