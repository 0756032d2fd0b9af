//! User repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use common::Tier;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, User};

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let tier: String = row.try_get("tier")?;
    let tier = tier.parse::<Tier>().map_err(anyhow::Error::msg)?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        tier,
        subscription_status: row.try_get("subscription_status")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<Option<User>> {
        info!("Creating new user: {}", new_user.email);

        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, tier, subscription_status, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, 'inactive', $4, $5, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, tier, subscription_status, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(Tier::Free.as_str())
        .bind(&new_user.password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, tier, subscription_status, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, tier, subscription_status, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }
}
