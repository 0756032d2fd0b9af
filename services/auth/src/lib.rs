//! Credential and token service for BakeProfit
//!
//! Password hashing, token issuance and verification, and the
//! signup/login/refresh/logout HTTP surface. The API service links this
//! crate for bearer-token verification and user lookups.

use std::sync::Arc;

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod validation;

use crate::{jwt::TokenService, repositories::UserStore, validation::PasswordPolicy};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub token_service: TokenService,
    pub user_store: Arc<dyn UserStore>,
    pub password_policy: Arc<PasswordPolicy>,
    /// Set the `Secure` flag on the refresh cookie
    pub secure_cookies: bool,
}
