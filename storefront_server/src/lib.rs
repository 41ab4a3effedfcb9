//! # Storefront gateway server
//! This module hosts the HTTP surface of the storefront payment gateway. It is responsible for:
//! * the authenticated shopping API (cart maintenance, order placement, order queries),
//! * checkout-session creation against the payment provider, and
//! * listening for incoming webhook deliveries from the provider and feeding them to the
//!   reconciliation engine.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for
//! more information.
//!
//! ## Routes
//! * `/health`: a health check route that returns a 200 OK response.
//! * `/api/...`: the authenticated shopping API (JWT bearer tokens).
//! * `/webhook/stripe`: the provider webhook endpoint. Publicly reachable; the HMAC
//!   signature on each delivery is the sole authentication boundary.
pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
