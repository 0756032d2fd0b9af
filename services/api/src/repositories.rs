//! Repositories for monthly usage counters
//!
//! Usage is partitioned by `(user_id, month)` where `month` is the `YYYY-MM`
//! of the store's clock at call time. A new month simply starts a new record,
//! so counters reset without any cleanup job.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{UsageCounts, UsageKind, UsageStats};

pub mod memory;
pub mod usage;

pub use memory::MemoryUsageStore;
pub use usage::UsageRepository;

/// `YYYY-MM` key for the month containing `now`
pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Per-user monthly counters
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Current-month counts; all zero (and nothing written) when no record exists
    async fn get_usage_stats(&self, user_id: Uuid) -> Result<UsageStats>;

    /// Atomically add one to `kind`, creating the month's record if needed
    async fn increment_usage(&self, user_id: Uuid, kind: UsageKind) -> Result<()>;

    /// Atomically subtract one from `kind` unless it is already zero
    async fn decrement_usage(&self, user_id: Uuid, kind: UsageKind) -> Result<()>;

    /// Overwrite all four counters for the current month
    async fn set_usage_count(&self, user_id: Uuid, counts: UsageCounts) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_key_is_zero_padded() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 17, 45, 0).unwrap();
        assert_eq!(month_key(now), "2024-03");

        let december = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(month_key(december), "2023-12");
    }
}
