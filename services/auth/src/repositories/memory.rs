//! In-memory user store for tests and local development

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use common::Tier;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, User};

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change a user's tier, as the billing flow does after an upgrade
    pub async fn set_tier(&self, id: Uuid, tier: Tier) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.tier = tier;
                user.subscription_status = match tier {
                    Tier::Pro => "active".to_string(),
                    Tier::Free => "inactive".to_string(),
                };
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Drop a user, simulating an account deleted after token issuance
    pub async fn remove(&self, id: Uuid) -> bool {
        self.users.write().await.remove(&id).is_some()
    }
}

#[async_trait]
impl UserStore for MemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Ok(None);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            tier: Tier::Free,
            subscription_status: "inactive".to_string(),
            password_hash: new_user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(Some(user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}
