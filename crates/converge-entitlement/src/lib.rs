//! Converge Entitlement
//!
//! Applies [`converge_core`] to subscription entitlements: wait until a
//! store consistently reports a product as active, optionally after
//! purchasing it, and cross-check the active set against the store's
//! transaction listing as a non-fatal diagnostic.
//!
//! # Modules
//!
//! - [`source`]     : `EntitlementSource` trait (the external store)
//! - [`model`]      : `TransactionRecord`, `TransactionState`, `PurchaseOptions`
//! - [`adapter`]    : `wait_for_entitlement()`, `purchase_and_wait()`, `EntitlementWaiter`
//! - [`cross_check`]: `cross_check()` / `EntitlementMismatch`
//! - [`fakes`]      : `MemoryEntitlementSource` for tests and simulations
//! - [`error`]      : `EntitlementError` / `EntitlementResult`

pub mod adapter;
pub mod cross_check;
pub mod error;
pub mod fakes;
pub mod model;
pub mod obs;
pub mod source;

pub use adapter::{purchase_and_wait, wait_for_entitlement, EntitlementReport, EntitlementWaiter};
pub use cross_check::{cross_check, EntitlementMismatch};
pub use error::{EntitlementError, EntitlementResult};
pub use fakes::MemoryEntitlementSource;
pub use model::{PurchaseOptions, TransactionRecord, TransactionState};
pub use source::EntitlementSource;
