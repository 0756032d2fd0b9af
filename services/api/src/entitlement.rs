//! Entitlement evaluation: may this user create one more of something?
//!
//! The check is advisory. It does not reserve quota; callers increment usage
//! after a successful create, so two concurrent requests can both pass the
//! check before either increments.

use anyhow::Result;
use common::Tier;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{limits::LimitPolicy, models::UsageKind, repositories::UsageStore};

/// Outcome of a limit check. `limit`/`remaining` are `None` when unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitCheck {
    pub allowed: bool,
    pub limit: Option<u32>,
    pub used: u32,
    pub remaining: Option<u32>,
    pub message: String,
}

impl LimitCheck {
    fn unlimited(kind: UsageKind) -> Self {
        Self {
            allowed: true,
            limit: None,
            used: 0,
            remaining: None,
            message: format!("Unlimited {}", kind),
        }
    }
}

#[derive(Clone)]
pub struct EntitlementEvaluator {
    policy: Arc<LimitPolicy>,
    usage_store: Arc<dyn UsageStore>,
}

impl EntitlementEvaluator {
    pub fn new(policy: Arc<LimitPolicy>, usage_store: Arc<dyn UsageStore>) -> Self {
        Self {
            policy,
            usage_store,
        }
    }

    pub fn policy(&self) -> &LimitPolicy {
        &self.policy
    }

    /// Decide whether `user_id` on `tier` may add one more `kind`
    ///
    /// Pro users are allowed without reading usage at all.
    pub async fn check_limit(&self, user_id: Uuid, tier: Tier, kind: UsageKind) -> Result<LimitCheck> {
        if tier == Tier::Pro {
            return Ok(LimitCheck::unlimited(kind));
        }

        let Some(limit) = self.policy.get_limit(tier, kind.limit_type()) else {
            return Ok(LimitCheck::unlimited(kind));
        };

        let used = self.usage_store.get_usage_stats(user_id).await?.get(kind);
        Ok(evaluate(tier, kind, limit, used))
    }
}

fn evaluate(tier: Tier, kind: UsageKind, limit: u32, used: u32) -> LimitCheck {
    let allowed = used < limit;
    let remaining = limit.saturating_sub(used);

    let message = if allowed {
        format!("{} {} remaining", remaining, kind)
    } else {
        format!("You've reached your {} plan limit of {} {}", tier, limit, kind)
    };

    LimitCheck {
        allowed,
        limit: Some(limit),
        used,
        remaining: Some(remaining),
        message,
    }
}
