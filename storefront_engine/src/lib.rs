//! Storefront Payment Engine
//!
//! The core of the storefront gateway: converting shopping carts into durable orders with
//! correct inventory accounting, and reconciling those orders' payment state against a
//! third-party provider's webhook event stream.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the
//!    database directly; use the public API instead. The exception is the data types used in
//!    the database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@sfe_api`]): [`OrderFlowApi`] for the synchronous order
//!    placement flow and [`ReconciliationApi`] for the asynchronous payment state machine.
//!    Backends implement the traits in [`mod@traits`] to plug in.
//!
//! The engine also provides a set of events that can be subscribed to. These are emitted
//! after the corresponding database transaction commits; for example, when a payment
//! completes, an `OrderPaidEvent` is published. A simple actor framework lets you hook into
//! these events and perform custom actions.
pub mod db_types;
pub mod events;
mod sfe_api;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::{db_url, SqliteDatabase};
pub use sfe_api::{order_flow_api::OrderFlowApi, order_objects, reconciliation_api::ReconciliationApi};
pub use traits::{StorefrontApiError, StorefrontDatabase, StorefrontQuery};
