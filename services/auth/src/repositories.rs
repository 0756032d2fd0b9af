//! Repositories for user persistence

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewUser, User};

pub mod memory;
pub mod user;

pub use memory::MemoryUserRepository;
pub use user::UserRepository;

/// Account lookups needed by authentication and entitlement checks
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new `free` user; `None` when the email is already taken
    async fn create(&self, new_user: &NewUser) -> Result<Option<User>>;

    /// Find a user by (already normalized) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}
