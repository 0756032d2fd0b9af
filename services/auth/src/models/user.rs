//! User model and related functionality

use chrono::{DateTime, Utc};
use common::Tier;
use serde::Serialize;
use uuid::Uuid;

use crate::jwt::TokenPayload;

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Always stored lowercase
    pub email: String,
    pub tier: Tier,
    pub subscription_status: String,
    /// Absent for accounts created through an external identity provider
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Claims to embed in freshly issued tokens
    pub fn token_payload(&self) -> TokenPayload {
        TokenPayload {
            user_id: self.id,
            email: self.email.clone(),
            tier: self.tier,
        }
    }

    /// Client-facing view without credentials
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            tier: self.tier,
            subscription_status: self.subscription_status.clone(),
        }
    }
}

/// New user creation payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
}

/// User as returned in API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub tier: Tier,
    pub subscription_status: String,
}
