//! Payment-provider integrations. Stripe is the only provider wired in.
pub mod stripe;
