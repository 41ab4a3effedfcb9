//! Interface contracts for storefront database backends.
//!
//! Two traits split the surface along write/read lines:
//!
//! * [`StorefrontDatabase`] carries the transactional mutations: order placement, payment
//!   record management and the reconciliation state machine. Every multi-step mutation must
//!   run inside a single database transaction.
//! * [`StorefrontQuery`] carries the read-only lookups used by the HTTP layer and by the
//!   reconciliation flow.
//!
//! A backend implements both; the API structs in [`crate::sfe_api`] are generic over them so
//! that server endpoint tests can substitute mocks.
mod storefront_database;
mod storefront_query;

pub use storefront_database::{StorefrontApiError, StorefrontDatabase};
pub use storefront_query::StorefrontQuery;
