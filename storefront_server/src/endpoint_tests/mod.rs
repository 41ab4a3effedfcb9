//! In-process endpoint tests.
//!
//! Each test stands up the full actix `App` (routes, auth, webhook verification) over a
//! throwaway sqlite database, with only the provider's REST client stubbed out.
mod helpers;

mod checkout;
mod orders;
mod webhook;
