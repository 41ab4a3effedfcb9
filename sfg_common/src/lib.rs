//! Shared value types for the storefront payment gateway.
//!
//! This crate is deliberately tiny: it holds the types that every other member of the
//! workspace agrees on. Chiefly [`Money`], the exact minor-unit currency amount used by
//! the inventory ledger, orders and payments, and [`Secret`], a wrapper that keeps
//! credentials out of logs.

pub mod helpers;
mod money;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
