//! In-memory usage store for tests and local development

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{UsageStore, month_key};
use crate::models::{UsageCounts, UsageKind, UsageStats};

/// Largest value the `INTEGER` usage columns hold
const MAX_COUNT: u32 = i32::MAX as u32;

#[derive(Debug, Clone)]
struct UsageRecord {
    counts: UsageCounts,
    updated_at: DateTime<Utc>,
}

/// Mirrors the PostgreSQL semantics: one record per `(user, month)`, created
/// by the first write, with every mutation applied under a single lock.
#[derive(Clone)]
pub struct MemoryUsageStore {
    records: Arc<Mutex<HashMap<(Uuid, String), UsageRecord>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryUsageStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored `(user, month)` records
    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Last write time of the record for `user_id` in `month`
    pub async fn updated_at(&self, user_id: Uuid, month: &str) -> Option<DateTime<Utc>> {
        self.records
            .lock()
            .await
            .get(&(user_id, month.to_string()))
            .map(|record| record.updated_at)
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn get_usage_stats(&self, user_id: Uuid) -> Result<UsageStats> {
        let key = (user_id, month_key(self.clock.now()));
        let records = self.records.lock().await;

        Ok(records
            .get(&key)
            .map(|record| record.counts)
            .unwrap_or_default()
            .into())
    }

    async fn increment_usage(&self, user_id: Uuid, kind: UsageKind) -> Result<()> {
        let now = self.clock.now();
        let mut records = self.records.lock().await;

        let record = records
            .entry((user_id, month_key(now)))
            .or_insert_with(|| UsageRecord {
                counts: UsageCounts::default(),
                updated_at: now,
            });
        let counter = record.counts.get_mut(kind);
        if *counter >= MAX_COUNT {
            bail!("{} count {} out of range", kind, *counter as u64 + 1);
        }
        *counter += 1;
        record.updated_at = now;

        Ok(())
    }

    async fn decrement_usage(&self, user_id: Uuid, kind: UsageKind) -> Result<()> {
        let now = self.clock.now();
        let mut records = self.records.lock().await;

        if let Some(record) = records.get_mut(&(user_id, month_key(now))) {
            let counter = record.counts.get_mut(kind);
            if *counter > 0 {
                *counter -= 1;
                record.updated_at = now;
            }
        }

        Ok(())
    }

    async fn set_usage_count(&self, user_id: Uuid, counts: UsageCounts) -> Result<()> {
        if let Some(kind) = UsageKind::ALL.into_iter().find(|&k| counts.get(k) > MAX_COUNT) {
            bail!("{} count {} out of range", kind, counts.get(kind));
        }
        let now = self.clock.now();
        self.records.lock().await.insert(
            (user_id, month_key(now)),
            UsageRecord {
                counts,
                updated_at: now,
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::clock::ManualClock;

    fn store() -> (MemoryUsageStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap());
        (MemoryUsageStore::new(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn reading_missing_record_returns_zeros_without_creating_it() {
        let (store, _) = store();
        let user = Uuid::new_v4();

        assert_eq!(store.get_usage_stats(user).await.unwrap(), UsageStats::default());
        assert_eq!(store.get_usage_stats(user).await.unwrap(), UsageStats::default());
        assert_eq!(store.record_count().await, 0);
    }

    #[tokio::test]
    async fn increments_accumulate() {
        let (store, _) = store();
        let user = Uuid::new_v4();

        for _ in 0..100 {
            store.increment_usage(user, UsageKind::Recipes).await.unwrap();
        }

        let stats = store.get_usage_stats(user).await.unwrap();
        assert_eq!(stats.recipes, 100);
        assert_eq!(stats.orders_this_month, 0);
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn decrement_floors_at_zero() {
        let (store, _) = store();
        let user = Uuid::new_v4();

        store.decrement_usage(user, UsageKind::Recipes).await.unwrap();
        assert_eq!(store.get_usage_stats(user).await.unwrap().recipes, 0);
        assert_eq!(store.record_count().await, 0);

        store.increment_usage(user, UsageKind::Recipes).await.unwrap();
        store.decrement_usage(user, UsageKind::Recipes).await.unwrap();
        store.decrement_usage(user, UsageKind::Recipes).await.unwrap();
        assert_eq!(store.get_usage_stats(user).await.unwrap().recipes, 0);
    }

    #[tokio::test]
    async fn increment_past_column_maximum_fails() {
        let (store, _) = store();
        let user = Uuid::new_v4();
        let counts = UsageCounts {
            orders: MAX_COUNT,
            ..UsageCounts::default()
        };
        store.set_usage_count(user, counts).await.unwrap();

        assert!(store.increment_usage(user, UsageKind::Orders).await.is_err());
        assert_eq!(
            store.get_usage_stats(user).await.unwrap().orders_this_month,
            MAX_COUNT
        );

        store.increment_usage(user, UsageKind::Recipes).await.unwrap();
        assert_eq!(store.get_usage_stats(user).await.unwrap().recipes, 1);

        let oversized = UsageCounts {
            customers: MAX_COUNT + 1,
            ..UsageCounts::default()
        };
        assert!(store.set_usage_count(user, oversized).await.is_err());
        assert_eq!(store.get_usage_stats(user).await.unwrap().recipes, 1);
    }

    #[tokio::test]
    async fn concurrent_decrements_never_underflow() {
        let (store, _) = store();
        let user = Uuid::new_v4();
        for _ in 0..5 {
            store.increment_usage(user, UsageKind::Orders).await.unwrap();
        }

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.decrement_usage(user, UsageKind::Orders).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_usage_stats(user).await.unwrap().orders_this_month, 0);
    }

    #[tokio::test]
    async fn set_usage_count_overwrites_prior_increments() {
        let (store, _) = store();
        let user = Uuid::new_v4();
        for _ in 0..9 {
            store.increment_usage(user, UsageKind::Recipes).await.unwrap();
        }

        store
            .set_usage_count(
                user,
                UsageCounts {
                    recipes: 3,
                    orders: 7,
                    customers: 0,
                    inventory: 2,
                },
            )
            .await
            .unwrap();

        let stats = store.get_usage_stats(user).await.unwrap();
        assert_eq!(
            stats,
            UsageStats {
                recipes: 3,
                orders_this_month: 7,
                customers: 0,
                inventory_items: 2,
            }
        );
    }

    #[tokio::test]
    async fn new_month_starts_from_zero() {
        let (store, clock) = store();
        let user = Uuid::new_v4();
        store.increment_usage(user, UsageKind::Customers).await.unwrap();

        clock.set(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(store.get_usage_stats(user).await.unwrap().customers, 0);

        store.increment_usage(user, UsageKind::Customers).await.unwrap();
        assert_eq!(store.record_count().await, 2);
        assert!(store.updated_at(user, "2024-04").await.is_some());
        assert_eq!(
            store.updated_at(user, "2024-05").await,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let (store, _) = store();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        store.increment_usage(alice, UsageKind::Inventory).await.unwrap();
        assert_eq!(store.get_usage_stats(alice).await.unwrap().inventory_items, 1);
        assert_eq!(store.get_usage_stats(bob).await.unwrap().inventory_items, 0);
    }
}
