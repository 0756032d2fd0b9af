//! Usage repository for database operations

use anyhow::{Context, Result};
use async_trait::async_trait;
use common::clock::Clock;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{UsageStore, month_key};
use crate::models::{UsageCounts, UsageKind, UsageStats};

/// PostgreSQL-backed usage repository
#[derive(Clone)]
pub struct UsageRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl UsageRepository {
    /// Create a new usage repository
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn to_column_value(value: u32, kind: UsageKind) -> Result<i32> {
    i32::try_from(value).with_context(|| format!("{} count {} out of range", kind, value))
}

fn from_column_value(value: i32) -> u32 {
    // Columns carry CHECK (>= 0)
    u32::try_from(value).unwrap_or(0)
}

#[async_trait]
impl UsageStore for UsageRepository {
    async fn get_usage_stats(&self, user_id: Uuid) -> Result<UsageStats> {
        let month = month_key(self.clock.now());

        let row = sqlx::query(
            r#"
            SELECT recipes, orders, customers, inventory
            FROM usage_records
            WHERE user_id = $1 AND month = $2
            "#,
        )
        .bind(user_id)
        .bind(&month)
        .fetch_optional(&self.pool)
        .await?;

        let counts = match row {
            Some(row) => UsageCounts {
                recipes: from_column_value(row.try_get("recipes")?),
                orders: from_column_value(row.try_get("orders")?),
                customers: from_column_value(row.try_get("customers")?),
                inventory: from_column_value(row.try_get("inventory")?),
            },
            None => UsageCounts::default(),
        };

        Ok(counts.into())
    }

    async fn increment_usage(&self, user_id: Uuid, kind: UsageKind) -> Result<()> {
        let now = self.clock.now();
        let column = kind.column();

        // Column names come from a closed enum, never from input
        let statement = format!(
            r#"
            INSERT INTO usage_records (user_id, month, {column}, updated_at)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (user_id, month) DO UPDATE SET
            {column} = usage_records.{column} + 1,
            updated_at = EXCLUDED.updated_at
            "#
        );

        sqlx::query(&statement)
            .bind(user_id)
            .bind(month_key(now))
            .bind(now)
            .execute(&self.pool)
            .await?;

        debug!("Incremented {} for user {}", kind, user_id);
        Ok(())
    }

    async fn decrement_usage(&self, user_id: Uuid, kind: UsageKind) -> Result<()> {
        let now = self.clock.now();
        let column = kind.column();

        // Single conditional update: concurrent decrements cannot go below zero
        let statement = format!(
            r#"
            UPDATE usage_records
            SET {column} = {column} - 1, updated_at = $3
            WHERE user_id = $1 AND month = $2 AND {column} > 0
            "#
        );

        let result = sqlx::query(&statement)
            .bind(user_id)
            .bind(month_key(now))
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!("{} already at zero for user {}", kind, user_id);
        }
        Ok(())
    }

    async fn set_usage_count(&self, user_id: Uuid, counts: UsageCounts) -> Result<()> {
        let now = self.clock.now();

        sqlx::query(
            r#"
            INSERT INTO usage_records (user_id, month, recipes, orders, customers, inventory, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, month) DO UPDATE SET
            recipes = EXCLUDED.recipes,
            orders = EXCLUDED.orders,
            customers = EXCLUDED.customers,
            inventory = EXCLUDED.inventory,
            updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(month_key(now))
        .bind(to_column_value(counts.recipes, UsageKind::Recipes)?)
        .bind(to_column_value(counts.orders, UsageKind::Orders)?)
        .bind(to_column_value(counts.customers, UsageKind::Customers)?)
        .bind(to_column_value(counts.inventory, UsageKind::Inventory)?)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
