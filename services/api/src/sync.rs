//! Reconciliation of client-tracked usage tallies
//!
//! Clients count creates locally for instant feedback and periodically push
//! their totals. The push is a full snapshot: it replaces the server's
//! current-month record outright, with no diffing against what was there.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{UsageCounts, UsageKind, UsageStats, UsageSyncRequest},
    repositories::UsageStore,
};

/// Largest count a single counter can hold
const MAX_COUNT: i64 = i32::MAX as i64;

impl UsageSyncRequest {
    /// Reject negative or oversized tallies before anything is written
    pub fn into_counts(self) -> Result<UsageCounts, String> {
        let convert = |value: i64, kind: UsageKind| -> Result<u32, String> {
            if !(0..=MAX_COUNT).contains(&value) {
                return Err(format!(
                    "{} must be a non-negative integer no greater than {}",
                    kind, MAX_COUNT
                ));
            }
            u32::try_from(value).map_err(|e| e.to_string())
        };

        Ok(UsageCounts {
            recipes: convert(self.recipes, UsageKind::Recipes)?,
            orders: convert(self.orders, UsageKind::Orders)?,
            customers: convert(self.customers, UsageKind::Customers)?,
            inventory: convert(self.inventory, UsageKind::Inventory)?,
        })
    }
}

#[derive(Clone)]
pub struct SyncReconciler {
    usage_store: Arc<dyn UsageStore>,
}

impl SyncReconciler {
    pub fn new(usage_store: Arc<dyn UsageStore>) -> Self {
        Self { usage_store }
    }

    /// Make `counts` the user's current-month snapshot and return it as stored
    pub async fn reconcile(&self, user_id: Uuid, counts: UsageCounts) -> Result<UsageStats> {
        self.usage_store.set_usage_count(user_id, counts).await?;
        info!(
            "Synced usage for user {}: recipes={} orders={} customers={} inventory={}",
            user_id, counts.recipes, counts.orders, counts.customers, counts.inventory
        );

        self.usage_store.get_usage_stats(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryUsageStore;
    use common::clock::SystemClock;

    #[test]
    fn rejects_negative_and_oversized_counts() {
        let negative = UsageSyncRequest {
            orders: -1,
            ..UsageSyncRequest::default()
        };
        assert_eq!(
            negative.into_counts(),
            Err("orders must be a non-negative integer no greater than 2147483647".to_string())
        );

        let oversized = UsageSyncRequest {
            inventory: MAX_COUNT + 1,
            ..UsageSyncRequest::default()
        };
        assert!(oversized.into_counts().is_err());
    }

    #[tokio::test]
    async fn snapshot_replaces_previous_counts() {
        let store = Arc::new(MemoryUsageStore::new(Arc::new(SystemClock)));
        let user = Uuid::new_v4();
        for _ in 0..4 {
            store.increment_usage(user, UsageKind::Recipes).await.unwrap();
        }
        store.increment_usage(user, UsageKind::Customers).await.unwrap();

        let reconciler = SyncReconciler::new(store.clone());
        let request = UsageSyncRequest {
            recipes: 2,
            orders: 11,
            ..UsageSyncRequest::default()
        };
        let stats = reconciler
            .reconcile(user, request.into_counts().unwrap())
            .await
            .unwrap();

        assert_eq!(stats.recipes, 2);
        assert_eq!(stats.orders_this_month, 11);
        assert_eq!(stats.customers, 0);
        assert_eq!(stats.inventory_items, 0);
    }
}
