//! Common library for the BakeProfit services
//!
//! This crate provides shared functionality used across the authentication
//! and API services: database connectivity and migrations, error types,
//! subscription tiers, listener configuration and an injectable clock.

pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod tier;

pub use tier::Tier;
