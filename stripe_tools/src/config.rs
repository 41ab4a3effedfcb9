use log::*;
use sfg_common::Secret;

const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    /// The secret API key (`sk_...`) used to authenticate calls to the provider.
    pub secret_key: Secret<String>,
    /// The webhook endpoint signing secret (`whsec_...`).
    pub webhook_secret: Secret<String>,
    pub api_base: String,
    /// Where the provider redirects the shopper after a completed checkout.
    pub success_url: String,
    /// Where the provider redirects the shopper after an abandoned checkout.
    pub cancel_url: String,
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let secret_key = Secret::new(std::env::var("SFG_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("SFG_STRIPE_SECRET_KEY not set. Checkout-session creation will be rejected by the provider.");
            "sk_test_00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("SFG_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("SFG_STRIPE_WEBHOOK_SECRET not set. Incoming webhook deliveries will fail signature checks.");
            "whsec_00000000000000".to_string()
        }));
        let api_base = std::env::var("SFG_STRIPE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let success_url = std::env::var("SFG_CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| {
            warn!("SFG_CHECKOUT_SUCCESS_URL not set, using a localhost default");
            "http://localhost:8360/checkout/success".to_string()
        });
        let cancel_url = std::env::var("SFG_CHECKOUT_CANCEL_URL").unwrap_or_else(|_| {
            warn!("SFG_CHECKOUT_CANCEL_URL not set, using a localhost default");
            "http://localhost:8360/checkout/cancel".to_string()
        });
        Self { secret_key, webhook_secret, api_base, success_url, cancel_url }
    }
}
