//! Subscription entitlement and usage service for BakeProfit
//!
//! Tier limits, per-month usage counters, and the check/sync endpoints the
//! client consults before letting a user create another recipe, order,
//! customer or inventory item.

pub mod entitlement;
pub mod error;
pub mod limits;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod sync;

pub use state::AppState;
